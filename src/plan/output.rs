// JSON rendering of the sizing reports and of the plans.

use crate::plan::*;

fn municipality_to_json(m: &Municipality) -> JSValue {
    json!({"uf": m.uf, "name": m.name})
}

fn parameters_to_json(sizing: &SizingResult, hdi: Option<f64>) -> JSValue {
    let c = &sizing.config;
    json!({
        "electors": sizing.facts.electors_total,
        "population": sizing.facts.population_total,
        "zones": sizing.facts.zone_count,
        "hdi": hdi,
        "confidencePct": sizing.params.confidence_pct(),
        "marginPct": sizing.params.margin_pct(),
        "designEffect": c.design_effect,
        "responseRate": c.response_rate,
        "minInterviewsPerZone": c.min_interviews_per_zone,
        "municipalFloor": c.municipal_floor,
        "roundingStep": c.rounding_step,
    })
}

fn sizing_to_json(sizing: &SizingResult) -> JSValue {
    json!({
        "cochranMinimum": sizing.cochran_minimum,
        "deffAdjusted": sizing.deff_adjusted,
        "zoneFloor": sizing.zone_floor,
        "municipalFloor": sizing.municipal_floor,
        "recommended": sizing.recommended,
        "fieldTarget": sizing.field_target,
        "realMarginPct": sizing.real_margin_pct,
        "justification": sizing.justification,
    })
}

fn scenarios_to_json(scenarios: &[Scenario]) -> Vec<JSValue> {
    scenarios
        .iter()
        .map(|s| {
            json!({
                "label": s.label,
                "confidence": s.confidence,
                "margin": s.margin,
                "cochranN": s.cochran_n,
                "recommendedN": s.recommended_n,
                "selected": s.is_selected,
            })
        })
        .collect()
}

fn zones_to_json(zones: &[Zone], quotas: &ZoneQuotaTable) -> Vec<JSValue> {
    zones
        .iter()
        .zip(quotas.quotas().iter())
        .map(|(z, q)| {
            json!({
                "zone": z.zone_id,
                "electorsTotal": z.electors_total,
                "electorsFemale": z.electors_female,
                "electorsMale": z.electors_male,
                "sections": z.sections,
                "quota": q.quota_total,
                "quotaFemale": q.quota_female,
                "quotaMale": q.quota_male,
            })
        })
        .collect()
}

fn table_to_json(t: &DimensionTable) -> JSValue {
    let categories: Vec<JSValue> = t
        .categories()
        .iter()
        .map(|c| {
            json!({
                "label": c.label,
                "percentage": c.percentage,
                "count": c.allocated_count,
                "samplePercentage": c.sample_percentage,
            })
        })
        .collect();
    // An empty table allocates nothing.
    let total_pct = if t.is_empty() { 0.0 } else { 100.0 };
    json!({
        "title": t.title(),
        "source": t.source(),
        "categories": categories,
        "total": {"count": t.allocated_total(), "pct": total_pct},
        "mappedElectors": t.mapped_electors(),
        "unmappedElectors": t.unmapped_electors(),
        "unmappedSharePct": t.unmapped_share_pct(),
    })
}

fn benchmark_to_json(b: &StratificationBenchmark) -> JSValue {
    let tables: Vec<JSValue> = b.tables.iter().map(table_to_json).collect();
    json!({
        "methodology": b.methodology,
        "notes": b.notes,
        "tables": tables,
    })
}

/// The sizing stages and the scenario table, without allocation.
pub fn sizing_report_to_json(request: &PlanRequest, report: &SizingReport) -> JSValue {
    json!({
        "municipality": municipality_to_json(&request.municipality),
        "parameters": parameters_to_json(&report.sizing, report.hdi),
        "sizing": sizing_to_json(&report.sizing),
        "scenarios": scenarios_to_json(&report.scenarios),
    })
}

pub fn plan_to_json(plan: &SamplingPlan) -> JSValue {
    let mode = match plan.mode {
        SampleMode::Automatic => "automatic",
        SampleMode::Manual => "manual",
    };
    json!({
        "municipality": municipality_to_json(&plan.municipality),
        "parameters": parameters_to_json(&plan.sizing, plan.hdi),
        "sizing": sizing_to_json(&plan.sizing),
        "scenarios": scenarios_to_json(&plan.scenarios),
        "sample": {
            "mode": mode,
            "requested": plan.requested_sample,
            "recommended": plan.sizing.recommended,
            "minimum": plan.sizing.cochran_minimum,
            "final": plan.final_sample,
            "finalRealMarginPct": plan.final_real_margin_pct,
        },
        "zones": zones_to_json(&plan.zones, &plan.zone_quotas),
        "quotaTotals": {
            "total": plan.zone_quotas.sample(),
            "female": plan.zone_quotas.total_female(),
            "male": plan.zone_quotas.total_male(),
        },
        "benchmark": benchmark_to_json(&plan.benchmark),
        "narrative": plan.narrative,
    })
}

mod apportion;
pub mod builder;
mod config;
pub mod manual;
mod profile;
mod quotas;
mod scenarios;
mod sizing;

use log::{debug, info};

pub use crate::apportion::apportion;
pub use crate::config::*;
pub use crate::profile::{
    dimension_table, gender_table, map_age, map_education, map_gender, normalize_label, profile_strata,
    AgeBracket, CanonicalCategory, EducationLevel, Gender, Mapping, GENDER_SOURCE, PROFILE_SOURCE,
};
pub use crate::quotas::allocate_zone_quotas;
pub use crate::scenarios::{generate_scenarios, SCENARIO_CATALOG};
pub use crate::sizing::{minimum_sample, real_margin_pct, recommended_sample, z_score};

use crate::sizing::format_thousands;

/// Builds the complete sampling plan of a municipality.
///
/// Arguments:
/// * `request` the zones, profile and parameters of the municipality
/// * `config` the operational constants of the sizing pipeline
///
/// The sample is the recommended one, unless the request imposes a size. An
/// imposed size is never allowed below the Cochran minimum.
pub fn build_sampling_plan(request: &PlanRequest, config: &SamplingConfig) -> Result<SamplingPlan, SamplingErrors> {
    info!(
        "Building sampling plan for {} ({}): {} zones, params: {:?}",
        request.municipality.name,
        request.municipality.uf,
        request.zones.len(),
        request.params
    );
    let facts = population_facts(request)?;
    let sizing = recommended_sample(&facts, &request.params, config)?;
    let scenarios = generate_scenarios(facts.electors_total, facts.zone_count, &request.params, config)?;

    let (mode, final_sample) = match request.requested_sample {
        None => (SampleMode::Automatic, sizing.recommended),
        Some(requested) => (SampleMode::Manual, requested.max(sizing.cochran_minimum)),
    };
    debug!(
        "build_sampling_plan: mode={:?} requested={:?} recommended={} final={}",
        mode, request.requested_sample, sizing.recommended, final_sample
    );
    let final_real_margin_pct = real_margin_pct(facts.electors_total, final_sample, request.params.confidence);

    let zone_quotas = allocate_zone_quotas(&request.zones, final_sample)?;
    let benchmark = profile_strata(&request.zones, request.profile.as_deref(), final_sample)?;
    let narrative = narrative(
        &request.params,
        final_sample,
        facts.electors_total,
        zone_quotas.quotas().len(),
        final_real_margin_pct,
        &benchmark,
    );
    info!(
        "Plan for {}: {} interviews ({:?}), real margin ±{}%",
        request.municipality.name, final_sample, mode, final_real_margin_pct
    );

    Ok(SamplingPlan {
        municipality: request.municipality.clone(),
        hdi: request.hdi,
        zones: request.zones.clone(),
        sizing,
        scenarios,
        mode,
        requested_sample: request.requested_sample,
        final_sample,
        final_real_margin_pct,
        zone_quotas,
        benchmark,
        narrative,
    })
}

/// Sizes a municipality without allocating the sample.
///
/// The profile and the requested size of the request are ignored.
pub fn size_municipality(request: &PlanRequest, config: &SamplingConfig) -> Result<SizingReport, SamplingErrors> {
    let facts = population_facts(request)?;
    let sizing = recommended_sample(&facts, &request.params, config)?;
    let scenarios = generate_scenarios(facts.electors_total, facts.zone_count, &request.params, config)?;
    Ok(SizingReport {
        sizing,
        scenarios,
        hdi: request.hdi,
    })
}

fn population_facts(request: &PlanRequest) -> Result<PopulationFacts, SamplingErrors> {
    if request.zones.is_empty() {
        return Err(SamplingErrors::InvalidPopulation(format!(
            "no electoral zone for {} ({})",
            request.municipality.name, request.municipality.uf
        )));
    }
    let electors_total: u64 = request.zones.iter().map(|z| z.electors_total).sum();
    if electors_total == 0 {
        return Err(SamplingErrors::InvalidPopulation(format!(
            "{} ({}) has no registered elector",
            request.municipality.name, request.municipality.uf
        )));
    }
    Ok(PopulationFacts {
        electors_total,
        population_total: request.population_total.unwrap_or(electors_total),
        zone_count: request.zones.len() as u32,
    })
}

fn narrative(
    params: &SamplingParameters,
    sample: u64,
    electors: u64,
    zone_count: usize,
    real_margin: f64,
    benchmark: &StratificationBenchmark,
) -> String {
    let profiled = [ProfileDimension::Education, ProfileDimension::Age]
        .iter()
        .any(|d| benchmark.table(*d).map(|t| !t.is_empty()).unwrap_or(false));
    let mut benchmark_block = String::new();
    if benchmark.tables.iter().any(|t| !t.is_empty()) {
        benchmark_block.push_str(
            "The plan also includes a stratified field benchmark (gender, education and age group), \
             allocated by largest remainder (Hamilton) so that the quotas add up exactly. \
             Gender is anchored on the municipal electorate observed by the TSE",
        );
        if profiled {
            benchmark_block.push_str(
                "; education and age group are anchored on the detailed profile by polling section of \
                 the municipality itself, without synthetic percentages",
            );
        }
        benchmark_block.push_str(". ");
    }
    format!(
        "This sampling plan was designed to ensure statistical robustness, operational feasibility and \
         methodological traceability. Sample sizing assumes a finite population and applies Cochran's \
         formula with conservative maximum variance parameters (p=q=0.5), resulting in a final sample of \
         {} interviews for a universe of {} electors. The design meets a confidence level of {}% and a \
         maximum planned margin of error of ±{:.1}%, with an estimated effective margin of ±{}%. \
         Selection is stratified by electoral zone, with proportional allocation and largest remainder \
         adjustment, covering all {} strata and adding up to the sample total. {}\
         Sources are official and public, with their reference period stated in the metadata, allowing \
         technical audit and reproducibility of the delivery.",
        format_thousands(sample),
        format_thousands(electors),
        params.confidence_pct(),
        params.margin_pct(),
        real_margin,
        zone_count,
        benchmark_block
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ten_zones() -> Vec<Zone> {
        (1..=10)
            .map(|idx| Zone {
                zone_id: format!("{:03}", idx),
                electors_total: 50_000,
                electors_female: 26_000,
                electors_male: 24_000,
                sections: 120,
            })
            .collect()
    }

    fn request(requested_sample: Option<u64>) -> PlanRequest {
        PlanRequest {
            municipality: Municipality {
                uf: "SP".to_string(),
                name: "Campinas".to_string(),
            },
            zones: ten_zones(),
            profile: None,
            population_total: Some(1_200_000),
            hdi: Some(0.805),
            params: SamplingParameters::DEFAULT,
            requested_sample,
        }
    }

    #[test]
    fn automatic_plan() {
        let _ = env_logger::builder().is_test(true).try_init();
        let plan = build_sampling_plan(&request(None), &SamplingConfig::DEFAULT).unwrap();
        assert_eq!(plan.mode, SampleMode::Automatic);
        assert_eq!(plan.sizing.recommended, 500);
        assert_eq!(plan.final_sample, 500);
        assert_eq!(plan.final_real_margin_pct, 4.38);
        assert_eq!(plan.scenarios.len(), 7);
        assert_eq!(plan.zone_quotas.sample(), 500);
        for q in plan.zone_quotas.quotas() {
            assert_eq!((q.quota_total, q.quota_female, q.quota_male), (50, 26, 24));
        }
        assert_eq!(plan.benchmark.tables.len(), 3);
        assert_eq!(plan.hdi, Some(0.805));
        assert_eq!(plan.sizing.facts.population_total, 1_200_000);
    }

    #[test]
    fn manual_plan_above_minimum() {
        let plan = build_sampling_plan(&request(Some(1_000)), &SamplingConfig::DEFAULT).unwrap();
        assert_eq!(plan.mode, SampleMode::Manual);
        assert_eq!(plan.requested_sample, Some(1_000));
        assert_eq!(plan.final_sample, 1_000);
        assert_eq!(plan.final_real_margin_pct, 3.1);
        // The recommendation is still reported.
        assert_eq!(plan.sizing.recommended, 500);
        assert_eq!(plan.zone_quotas.quotas().iter().map(|q| q.quota_total).sum::<u64>(), 1_000);
    }

    #[test]
    fn manual_plan_is_raised_to_minimum() {
        let plan = build_sampling_plan(&request(Some(300)), &SamplingConfig::DEFAULT).unwrap();
        assert_eq!(plan.mode, SampleMode::Manual);
        assert_eq!(plan.final_sample, 384);
        assert_eq!(plan.zone_quotas.sample(), 384);
        for t in plan.benchmark.tables.iter().filter(|t| !t.is_empty()) {
            assert_eq!(t.allocated_total(), 384);
        }
    }

    #[test]
    fn population_falls_back_to_electors() {
        let mut req = request(None);
        req.population_total = None;
        let plan = build_sampling_plan(&req, &SamplingConfig::DEFAULT).unwrap();
        assert_eq!(plan.sizing.facts.population_total, 500_000);
    }

    #[test]
    fn invalid_population() {
        let mut req = request(None);
        req.zones = vec![];
        assert!(matches!(
            build_sampling_plan(&req, &SamplingConfig::DEFAULT),
            Err(SamplingErrors::InvalidPopulation(_))
        ));
        let mut req = request(None);
        for z in req.zones.iter_mut() {
            z.electors_total = 0;
            z.electors_female = 0;
            z.electors_male = 0;
        }
        assert!(build_sampling_plan(&req, &SamplingConfig::DEFAULT).is_err());
        assert!(size_municipality(&req, &SamplingConfig::DEFAULT).is_err());
    }

    #[test]
    fn narrative_text() {
        let plan = build_sampling_plan(&request(None), &SamplingConfig::DEFAULT).unwrap();
        let n = &plan.narrative;
        assert!(n.contains("final sample of 500 interviews for a universe of 500.000 electors"), "{}", n);
        assert!(n.contains("confidence level of 95%"), "{}", n);
        assert!(n.contains("margin of error of ±5.0%"), "{}", n);
        assert!(n.contains("effective margin of ±4.38%"), "{}", n);
        assert!(n.contains("all 10 strata"), "{}", n);
        assert!(n.contains("Gender is anchored"), "{}", n);
        // No profile: education and age are not claimed.
        assert!(!n.contains("education and age group are anchored"), "{}", n);
    }

    #[test]
    fn narrative_with_profile() {
        let mut req = request(None);
        req.profile = Some(vec![
            ProfileRecord {
                dimension: ProfileDimension::Education,
                raw_label: "SUPERIOR COMPLETO".to_string(),
                elector_count: 1_000,
            },
            ProfileRecord {
                dimension: ProfileDimension::Age,
                raw_label: "25 A 34 ANOS".to_string(),
                elector_count: 1_000,
            },
        ]);
        let plan = build_sampling_plan(&req, &SamplingConfig::DEFAULT).unwrap();
        assert!(plan.narrative.contains("education and age group are anchored"));
        assert!(plan.benchmark.notes.is_empty());
        let edu = plan.benchmark.table(ProfileDimension::Education).unwrap();
        assert_eq!(edu.categories()[4].allocated_count, 500);
    }

    #[test]
    fn sizing_only() {
        let report = size_municipality(&request(Some(2_000)), &SamplingConfig::DEFAULT).unwrap();
        assert_eq!(report.sizing.recommended, 500);
        assert_eq!(report.sizing.field_target, 630);
        assert_eq!(report.scenarios.iter().filter(|s| s.is_selected).count(), 1);
        assert_eq!(report.hdi, Some(0.805));
    }

    #[test]
    fn deterministic() {
        let req = request(Some(777));
        let p1 = build_sampling_plan(&req, &SamplingConfig::DEFAULT).unwrap();
        let p2 = build_sampling_plan(&req, &SamplingConfig::DEFAULT).unwrap();
        assert_eq!(p1, p2);
    }
}

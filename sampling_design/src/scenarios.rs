use log::debug;

use crate::config::*;
use crate::sizing::{minimum_sample, rounded_recommendation};

/// The standard confidence/margin combinations offered to clients, from the
/// cheapest to the most rigorous. The order is the presentation order.
pub const SCENARIO_CATALOG: [(f64, f64, &str); 7] = [
    (0.90, 0.07, "Economical (90% / ±7%)"),
    (0.90, 0.05, "Basic (90% / ±5%)"),
    (0.95, 0.05, "Standard (95% / ±5%) ★"),
    (0.95, 0.04, "Enhanced (95% / ±4%)"),
    (0.95, 0.03, "Precise (95% / ±3%)"),
    (0.99, 0.05, "Rigorous (99% / ±5%)"),
    (0.99, 0.03, "Maximum (99% / ±3%)"),
];

/// Sizes every entry of the catalog for the given electorate.
///
/// Entries go through the same design effect, floors and rounding as the
/// recommended sample, but without field target or real margin. The entry
/// equal to `params` (if any) is flagged as selected.
pub fn generate_scenarios(
    electors_total: u64,
    zone_count: u32,
    params: &SamplingParameters,
    config: &SamplingConfig,
) -> Result<Vec<Scenario>, SamplingErrors> {
    config.validate()?;
    let mut res: Vec<Scenario> = Vec::with_capacity(SCENARIO_CATALOG.len());
    for (confidence, margin, label) in SCENARIO_CATALOG.iter() {
        let cochran_n = minimum_sample(electors_total, *confidence, *margin)?;
        let recommended_n = rounded_recommendation(cochran_n, zone_count, config);
        let is_selected = *confidence == params.confidence && *margin == params.margin_of_error;
        debug!(
            "generate_scenarios: {}: cochran={} recommended={} selected={}",
            label, cochran_n, recommended_n, is_selected
        );
        res.push(Scenario {
            label: label.to_string(),
            confidence: *confidence,
            margin: *margin,
            cochran_n,
            recommended_n,
            is_selected,
        });
    }
    Ok(res)
}

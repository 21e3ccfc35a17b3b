//! Sample sizing: Cochran's formula for a finite population, followed by the
//! operational adjustments (design effect, floors, rounding, field target).

use log::{debug, info};

use crate::config::*;

// Maximum variance: the most conservative assumption for a proportion.
const P: f64 = 0.5;
const Q: f64 = 1.0 - P;

const Z_TABLE: [(f64, f64); 3] = [(0.90, 1.645), (0.95, 1.96), (0.99, 2.576)];
const DEFAULT_Z: f64 = 1.96;

/// The Z-score of a confidence level.
///
/// Only 0.90, 0.95 and 0.99 are tabulated. Any other value uses the score of
/// the 95% level.
pub fn z_score(confidence: f64) -> f64 {
    Z_TABLE
        .iter()
        .find(|(c, _)| *c == confidence)
        .map(|(_, z)| *z)
        .unwrap_or(DEFAULT_Z)
}

/// Minimum sample size for a population of `population` individuals.
///
/// Cochran's formula with the finite population correction:
///
/// ```text
/// n = (Z² p q N) / (e² (N - 1) + Z² p q)
/// ```
///
/// with `p = q = 0.5`. The result is rounded up. An empty population needs no
/// interview.
///
/// ```
/// use sampling_design::minimum_sample;
/// assert_eq!(minimum_sample(500_000, 0.95, 0.05)?, 384);
/// # Ok::<(), sampling_design::SamplingErrors>(())
/// ```
pub fn minimum_sample(population: u64, confidence: f64, margin: f64) -> Result<u64, SamplingErrors> {
    if !(margin > 0.0 && margin < 1.0) {
        return Err(SamplingErrors::InvalidParameters(format!(
            "margin of error must be in (0, 1), got {}",
            margin
        )));
    }
    if population == 0 {
        return Ok(0);
    }
    let z = z_score(confidence);
    let n_infinite = (z.powi(2) * P * Q) / margin.powi(2);
    let n = population as f64;
    let res = (n_infinite * n) / (n_infinite + n - 1.0);
    Ok(res.ceil() as u64)
}

/// Runs the full sizing pipeline for one municipality.
///
/// Each stage holds or raises the candidate size:
/// 1. Cochran minimum over the electorate
/// 2. design effect
/// 3. minimum per zone, summed over the zones
/// 4. municipal floor
/// 5. rounding up to the configured step
/// 6. field target for the expected response rate
/// 7. the margin of error actually achieved by the recommended size
pub fn recommended_sample(
    facts: &PopulationFacts,
    params: &SamplingParameters,
    config: &SamplingConfig,
) -> Result<SizingResult, SamplingErrors> {
    config.validate()?;
    let cochran_minimum = minimum_sample(facts.electors_total, params.confidence, params.margin_of_error)?;
    let deff_adjusted = apply_design_effect(cochran_minimum, config);
    let zone_floor = zone_floor(facts.zone_count, config);
    let base = deff_adjusted.max(zone_floor).max(config.municipal_floor);
    let recommended = ceil_to_step(base, config.rounding_step);
    let field_target = field_target(recommended, config);
    let real_margin_pct = real_margin_pct(facts.electors_total, recommended, params.confidence);
    debug!(
        "recommended_sample: cochran={} deff={} zone_floor={} base={} recommended={} field={} margin={}",
        cochran_minimum, deff_adjusted, zone_floor, base, recommended, field_target, real_margin_pct
    );

    let mut res = SizingResult {
        cochran_minimum,
        deff_adjusted,
        zone_floor,
        municipal_floor: config.municipal_floor,
        recommended,
        field_target,
        real_margin_pct,
        justification: String::new(),
        facts: *facts,
        params: *params,
        config: *config,
    };
    res.justification = justification(&res);
    info!(
        "Sized {} electors over {} zones: recommended {} interviews ({} contacts)",
        facts.electors_total, facts.zone_count, recommended, field_target
    );
    Ok(res)
}

/// Stages 2 to 5 of the pipeline, shared with the scenario catalog.
pub(crate) fn rounded_recommendation(cochran: u64, zone_count: u32, config: &SamplingConfig) -> u64 {
    let adjusted = apply_design_effect(cochran, config)
        .max(zone_floor(zone_count, config))
        .max(config.municipal_floor);
    ceil_to_step(adjusted, config.rounding_step)
}

fn apply_design_effect(cochran: u64, config: &SamplingConfig) -> u64 {
    (cochran as f64 * config.design_effect).ceil() as u64
}

fn zone_floor(zone_count: u32, config: &SamplingConfig) -> u64 {
    zone_count as u64 * config.min_interviews_per_zone
}

fn field_target(recommended: u64, config: &SamplingConfig) -> u64 {
    let contacts = (recommended as f64 / config.response_rate).ceil() as u64;
    ceil_to_step(contacts, config.rounding_step)
}

fn ceil_to_step(value: u64, step: u64) -> u64 {
    value.div_ceil(step) * step
}

/// The margin of error (in percent, 2 decimals) achieved by a sample of
/// `sample` interviews out of `population`, with the finite population
/// correction. A census has no sampling error.
pub fn real_margin_pct(population: u64, sample: u64, confidence: f64) -> f64 {
    if sample == 0 || sample >= population {
        return 0.0;
    }
    let z = z_score(confidence);
    let n = sample as f64;
    let big_n = population as f64;
    let e = z * (P * Q / n).sqrt() * ((big_n - n) / (big_n - 1.0)).sqrt();
    round_to(e * 100.0, 2)
}

pub(crate) fn round_to(x: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (x * f).round() / f
}

/// Formats an integer with `.` as the thousands separator.
pub(crate) fn format_thousands(x: u64) -> String {
    let digits = x.to_string();
    let mut res = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            res.push('.');
        }
        res.push(c);
    }
    res
}

fn justification(sr: &SizingResult) -> String {
    let cfg = &sr.config;
    format!(
        "Cochran formula (finite population): n0 = {} interviews for N={} electors, confidence {}% and margin ±{:.1}%. \
         Operational design effect adjustment (DEFF={:.2}) → {}. \
         Municipal floor={} and minimum coverage per zone ({}×{}={}). \
         Final recommended value (completed interviews), rounded: {}. \
         Suggested field target with {}% response rate: {}. \
         Estimated real margin of error for completed interviews: ±{}%.",
        sr.cochran_minimum,
        format_thousands(sr.facts.electors_total),
        sr.params.confidence_pct(),
        sr.params.margin_pct(),
        cfg.design_effect,
        sr.deff_adjusted,
        cfg.municipal_floor,
        cfg.min_interviews_per_zone,
        sr.facts.zone_count,
        sr.zone_floor,
        sr.recommended,
        (cfg.response_rate * 100.0).round() as u32,
        sr.field_target,
        sr.real_margin_pct
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(electors_total: u64, zone_count: u32) -> PopulationFacts {
        PopulationFacts {
            electors_total,
            population_total: electors_total,
            zone_count,
        }
    }

    #[test]
    fn cochran_large_population() {
        assert_eq!(minimum_sample(500_000, 0.95, 0.05), Ok(384));
        assert_eq!(minimum_sample(500_000, 0.99, 0.03), Ok(1837));
        assert_eq!(minimum_sample(500_000, 0.90, 0.07), Ok(139));
    }

    #[test]
    fn cochran_small_populations() {
        assert_eq!(minimum_sample(0, 0.95, 0.05), Ok(0));
        assert_eq!(minimum_sample(1, 0.95, 0.05), Ok(1));
        assert_eq!(minimum_sample(10, 0.95, 0.05), Ok(10));
        assert_eq!(minimum_sample(1000, 0.95, 0.05), Ok(278));
    }

    #[test]
    fn cochran_rejects_bad_margin() {
        assert!(matches!(
            minimum_sample(1000, 0.95, 0.0),
            Err(SamplingErrors::InvalidParameters(_))
        ));
        assert!(minimum_sample(1000, 0.95, 1.0).is_err());
        assert!(minimum_sample(1000, 0.95, f64::NAN).is_err());
    }

    #[test]
    fn unknown_confidence_falls_back_to_95() {
        assert_eq!(z_score(0.97), 1.96);
        assert_eq!(minimum_sample(500_000, 0.97, 0.05), minimum_sample(500_000, 0.95, 0.05));
    }

    #[test]
    fn out_of_range_confidence_is_sized_at_95() {
        let f = facts(500_000, 10);
        let standard = recommended_sample(&f, &SamplingParameters::DEFAULT, &SamplingConfig::DEFAULT).unwrap();
        for confidence in [95.0, 1.0, 0.0] {
            let p = SamplingParameters::new(confidence, 0.05).unwrap();
            let res = recommended_sample(&f, &p, &SamplingConfig::DEFAULT).unwrap();
            assert_eq!(res.cochran_minimum, 384);
            assert_eq!(res.recommended, standard.recommended);
            assert_eq!(res.field_target, standard.field_target);
            assert_eq!(res.real_margin_pct, standard.real_margin_pct);
        }
        assert!(SamplingParameters::new(f64::NAN, 0.05).is_err());
        assert!(SamplingParameters::new(f64::INFINITY, 0.05).is_err());
        assert!(SamplingParameters::new(95.0, 0.0).is_err());
    }

    #[test]
    fn cochran_monotonicity() {
        let margins = [0.01, 0.02, 0.03, 0.04, 0.05, 0.07, 0.1, 0.2];
        for n in [50u64, 1_000, 35_000, 2_000_000] {
            for conf in [0.90, 0.95, 0.99] {
                let sizes: Vec<u64> = margins
                    .iter()
                    .map(|m| minimum_sample(n, conf, *m).unwrap())
                    .collect();
                assert!(sizes.windows(2).all(|w| w[0] >= w[1]), "{:?}", sizes);
            }
            for m in margins {
                let sizes: Vec<u64> = [0.90, 0.95, 0.99]
                    .iter()
                    .map(|c| minimum_sample(n, *c, m).unwrap())
                    .collect();
                assert!(sizes.windows(2).all(|w| w[0] <= w[1]), "{:?}", sizes);
            }
        }
    }

    #[test]
    fn pipeline_example() {
        let res = recommended_sample(&facts(500_000, 10), &SamplingParameters::DEFAULT, &SamplingConfig::DEFAULT)
            .unwrap();
        assert_eq!(res.cochran_minimum, 384);
        assert_eq!(res.deff_adjusted, 500);
        assert_eq!(res.zone_floor, 120);
        assert_eq!(res.municipal_floor, 400);
        assert_eq!(res.recommended, 500);
        assert_eq!(res.field_target, 630);
        assert_eq!(res.real_margin_pct, 4.38);
    }

    #[test]
    fn floors_dominate_small_designs() {
        // Municipal floor.
        let res = recommended_sample(&facts(1000, 1), &SamplingParameters::DEFAULT, &SamplingConfig::DEFAULT)
            .unwrap();
        assert_eq!(res.deff_adjusted, 362);
        assert_eq!(res.recommended, 400);
        assert_eq!(res.field_target, 500);
        assert_eq!(res.real_margin_pct, 3.8);

        // Zone floor.
        let res = recommended_sample(&facts(500_000, 60), &SamplingParameters::DEFAULT, &SamplingConfig::DEFAULT)
            .unwrap();
        assert_eq!(res.zone_floor, 720);
        assert_eq!(res.recommended, 720);
        assert_eq!(res.field_target, 900);
    }

    #[test]
    fn census_has_no_margin() {
        let res = recommended_sample(&facts(300, 1), &SamplingParameters::DEFAULT, &SamplingConfig::DEFAULT)
            .unwrap();
        assert_eq!(res.recommended, 400);
        assert_eq!(res.real_margin_pct, 0.0);
    }

    #[test]
    fn rounding_to_step() {
        let res = recommended_sample(&facts(20_000, 3), &SamplingParameters::DEFAULT, &SamplingConfig::DEFAULT)
            .unwrap();
        assert_eq!(res.cochran_minimum, 377);
        assert_eq!(res.deff_adjusted, 491);
        assert_eq!(res.recommended, 500);
        assert_eq!(res.recommended % 10, 0);
        assert_eq!(res.field_target % 10, 0);
    }

    #[test]
    fn configuration_is_injected() {
        let config = SamplingConfig {
            design_effect: 1.0,
            response_rate: 0.5,
            min_interviews_per_zone: 0,
            municipal_floor: 0,
            rounding_step: 1,
        };
        let res = recommended_sample(&facts(500_000, 10), &SamplingParameters::DEFAULT, &config).unwrap();
        assert_eq!(res.deff_adjusted, 384);
        assert_eq!(res.recommended, 384);
        assert_eq!(res.field_target, 768);
    }

    #[test]
    fn invalid_configuration() {
        let mut config = SamplingConfig::DEFAULT;
        config.rounding_step = 0;
        let res = recommended_sample(&facts(500_000, 10), &SamplingParameters::DEFAULT, &config);
        assert!(matches!(res, Err(SamplingErrors::InvalidConfig(_))));
        let mut config = SamplingConfig::DEFAULT;
        config.response_rate = 0.0;
        assert!(config.validate().is_err());
        let mut config = SamplingConfig::DEFAULT;
        config.design_effect = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn idempotent() {
        let f = facts(123_456, 7);
        let p = SamplingParameters::new(0.99, 0.04).unwrap();
        let r1 = recommended_sample(&f, &p, &SamplingConfig::DEFAULT).unwrap();
        let r2 = recommended_sample(&f, &p, &SamplingConfig::DEFAULT).unwrap();
        assert_eq!(r1, r2);
        assert_eq!(r1.real_margin_pct.to_bits(), r2.real_margin_pct.to_bits());
    }

    #[test]
    fn justification_mentions_each_stage() {
        let res = recommended_sample(&facts(500_000, 10), &SamplingParameters::DEFAULT, &SamplingConfig::DEFAULT)
            .unwrap();
        let j = &res.justification;
        assert!(j.contains("n0 = 384"), "{}", j);
        assert!(j.contains("N=500.000"), "{}", j);
        assert!(j.contains("confidence 95%"), "{}", j);
        assert!(j.contains("±5.0%"), "{}", j);
        assert!(j.contains("DEFF=1.30) → 500"), "{}", j);
        assert!(j.contains("(12×10=120)"), "{}", j);
        assert!(j.contains("80% response rate: 630"), "{}", j);
        assert!(j.contains("±4.38%"), "{}", j);
    }

    #[test]
    fn thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1.000");
        assert_eq!(format_thousands(1_234_567), "1.234.567");
    }
}

// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// One electoral zone of a municipality, as delivered by the electoral registry.
///
/// The counts are the source of the apportionment weights.
#[derive(PartialEq, Eq, Debug, Clone, Hash)]
pub struct Zone {
    pub zone_id: String,
    pub electors_total: u64,
    pub electors_female: u64,
    pub electors_male: u64,
    pub sections: u32,
}

/// The dimensions of the municipal profile table.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum ProfileDimension {
    Gender,
    Education,
    Age,
}

impl ProfileDimension {
    pub fn title(&self) -> &'static str {
        match self {
            ProfileDimension::Gender => "GENDER",
            ProfileDimension::Education => "EDUCATION",
            ProfileDimension::Age => "AGE GROUP",
        }
    }
}

/// A raw line of the municipal profile: a free-text category label as written
/// by the source, with the number of electors in it.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct ProfileRecord {
    pub dimension: ProfileDimension,
    pub raw_label: String,
    pub elector_count: u64,
}

/// Population figures for one municipality.
///
/// `electors_total <= population_total` is expected from official data but is
/// not checked.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct PopulationFacts {
    pub electors_total: u64,
    pub population_total: u64,
    pub zone_count: u32,
}

/// Confidence level and margin of error requested by the caller.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct SamplingParameters {
    pub confidence: f64,
    pub margin_of_error: f64,
}

impl SamplingParameters {
    pub const DEFAULT: SamplingParameters = SamplingParameters {
        confidence: 0.95,
        margin_of_error: 0.05,
    };

    /// Checks the margin of error.
    ///
    /// Any finite confidence level is accepted. Levels other than 0.90, 0.95
    /// and 0.99 are sized with the Z-score of the 95% level.
    pub fn new(confidence: f64, margin_of_error: f64) -> Result<SamplingParameters, SamplingErrors> {
        if !confidence.is_finite() {
            return Err(SamplingErrors::InvalidParameters(format!(
                "confidence must be a finite number, got {}",
                confidence
            )));
        }
        if !(margin_of_error > 0.0 && margin_of_error < 1.0) {
            return Err(SamplingErrors::InvalidParameters(format!(
                "margin of error must be in (0, 1), got {}",
                margin_of_error
            )));
        }
        Ok(SamplingParameters {
            confidence,
            margin_of_error,
        })
    }

    pub fn confidence_pct(&self) -> u32 {
        (self.confidence * 100.0).round() as u32
    }

    pub fn margin_pct(&self) -> f64 {
        (self.margin_of_error * 1000.0).round() / 10.0
    }
}

impl Default for SamplingParameters {
    fn default() -> Self {
        SamplingParameters::DEFAULT
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Municipality {
    /// Two-letter state code (UF).
    pub uf: String,
    pub name: String,
}

/// Everything the engine needs to build a plan for one municipality.
///
/// It is usually assembled with the [`crate::builder::PlanBuilder`].
#[derive(PartialEq, Debug, Clone)]
pub struct PlanRequest {
    pub municipality: Municipality,
    pub zones: Vec<Zone>,
    /// The detailed municipal profile. `None` when the source has no profile
    /// for this municipality.
    pub profile: Option<Vec<ProfileRecord>>,
    /// Total population. When missing, the electorate is used instead.
    pub population_total: Option<u64>,
    /// Human development index. Carried along for reports, not used in sizing.
    pub hdi: Option<f64>,
    pub params: SamplingParameters,
    /// A sample size imposed by the caller instead of the recommended one.
    pub requested_sample: Option<u64>,
}

// ******** Output data structures *********

/// The outcome of the sizing pipeline.
#[derive(PartialEq, Debug, Clone)]
pub struct SizingResult {
    pub cochran_minimum: u64,
    pub deff_adjusted: u64,
    pub zone_floor: u64,
    pub municipal_floor: u64,
    /// Completed interviews to collect.
    pub recommended: u64,
    /// Contacts to attempt in the field, given the expected response rate.
    pub field_target: u64,
    /// The margin of error achieved by `recommended`, in percent (2 decimals).
    pub real_margin_pct: f64,
    pub justification: String,
    // Echo of the inputs.
    pub facts: PopulationFacts,
    pub params: SamplingParameters,
    pub config: SamplingConfig,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Scenario {
    pub label: String,
    pub confidence: f64,
    pub margin: f64,
    pub cochran_n: u64,
    pub recommended_n: u64,
    pub is_selected: bool,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct ZoneQuota {
    pub zone_id: String,
    pub quota_total: u64,
    pub quota_female: u64,
    pub quota_male: u64,
}

/// The per-zone quotas of a plan.
///
/// Invariants, checked at construction:
/// - the quotas sum to the sample size
/// - in every zone, the female and male quotas sum to the zone quota
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ZoneQuotaTable {
    quotas: Vec<ZoneQuota>,
    sample: u64,
}

impl ZoneQuotaTable {
    pub fn new(quotas: Vec<ZoneQuota>, sample: u64) -> Result<ZoneQuotaTable, SamplingErrors> {
        for q in quotas.iter() {
            if q.quota_female + q.quota_male != q.quota_total {
                return Err(SamplingErrors::InconsistentResult(format!(
                    "zone {}: gender quotas {} + {} do not add up to {}",
                    q.zone_id, q.quota_female, q.quota_male, q.quota_total
                )));
            }
        }
        let total: u64 = quotas.iter().map(|q| q.quota_total).sum();
        if total != sample {
            return Err(SamplingErrors::InconsistentResult(format!(
                "zone quotas add up to {} instead of {}",
                total, sample
            )));
        }
        Ok(ZoneQuotaTable { quotas, sample })
    }

    pub fn quotas(&self) -> &[ZoneQuota] {
        &self.quotas
    }

    pub fn sample(&self) -> u64 {
        self.sample
    }

    pub fn total_female(&self) -> u64 {
        self.quotas.iter().map(|q| q.quota_female).sum()
    }

    pub fn total_male(&self) -> u64 {
        self.quotas.iter().map(|q| q.quota_male).sum()
    }
}

/// One category of a dimension table.
#[derive(PartialEq, Debug, Clone)]
pub struct CategoryShare {
    pub label: String,
    /// Share of the category in the (mapped) population, in percent.
    pub percentage: f64,
    pub allocated_count: u64,
    /// Share of the category in the allocated sample, in percent (2 decimals).
    pub sample_percentage: f64,
}

/// The benchmark distribution of the sample along one profiling dimension.
///
/// Categories follow the canonical order of the dimension. A non-empty table
/// always allocates exactly the sample size.
#[derive(PartialEq, Debug, Clone)]
pub struct DimensionTable {
    dimension: ProfileDimension,
    source: String,
    categories: Vec<CategoryShare>,
    mapped_electors: u64,
    unmapped_electors: u64,
    sample: u64,
}

impl DimensionTable {
    pub fn new(
        dimension: ProfileDimension,
        source: &str,
        categories: Vec<CategoryShare>,
        mapped_electors: u64,
        unmapped_electors: u64,
        sample: u64,
    ) -> Result<DimensionTable, SamplingErrors> {
        let allocated: u64 = categories.iter().map(|c| c.allocated_count).sum();
        if !categories.is_empty() && allocated != sample {
            return Err(SamplingErrors::InconsistentResult(format!(
                "{} table allocates {} instead of {}",
                dimension.title(),
                allocated,
                sample
            )));
        }
        Ok(DimensionTable {
            dimension,
            source: source.to_string(),
            categories,
            mapped_electors,
            unmapped_electors,
            sample,
        })
    }

    /// A table without categories, for dimensions without usable source data.
    pub fn empty(dimension: ProfileDimension, source: &str, unmapped_electors: u64, sample: u64) -> DimensionTable {
        DimensionTable {
            dimension,
            source: source.to_string(),
            categories: Vec::new(),
            mapped_electors: 0,
            unmapped_electors,
            sample,
        }
    }

    pub fn dimension(&self) -> ProfileDimension {
        self.dimension
    }

    pub fn title(&self) -> &'static str {
        self.dimension.title()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn categories(&self) -> &[CategoryShare] {
        &self.categories
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn allocated_total(&self) -> u64 {
        self.categories.iter().map(|c| c.allocated_count).sum()
    }

    pub fn sample(&self) -> u64 {
        self.sample
    }

    pub fn mapped_electors(&self) -> u64 {
        self.mapped_electors
    }

    pub fn unmapped_electors(&self) -> u64 {
        self.unmapped_electors
    }

    /// Fraction (0 to 1) of the electors of this dimension whose label did not
    /// map to any canonical category.
    pub fn unmapped_share(&self) -> f64 {
        let total = self.mapped_electors + self.unmapped_electors;
        if total == 0 {
            0.0
        } else {
            self.unmapped_electors as f64 / total as f64
        }
    }

    /// The unmapped share as a percentage, rounded to 2 decimals.
    pub fn unmapped_share_pct(&self) -> f64 {
        crate::sizing::round_to(self.unmapped_share() * 100.0, 2)
    }
}

/// The stratified benchmark tables of a plan, with the notes explaining how
/// they were obtained.
#[derive(PartialEq, Debug, Clone)]
pub struct StratificationBenchmark {
    pub methodology: String,
    pub notes: Vec<String>,
    pub tables: Vec<DimensionTable>,
}

impl StratificationBenchmark {
    pub fn table(&self, dimension: ProfileDimension) -> Option<&DimensionTable> {
        self.tables.iter().find(|t| t.dimension() == dimension)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum SampleMode {
    /// The recommended size is used.
    Automatic,
    /// The caller imposed a size (never below the Cochran minimum).
    Manual,
}

/// The complete sampling plan for a municipality.
#[derive(PartialEq, Debug, Clone)]
pub struct SamplingPlan {
    pub municipality: Municipality,
    pub hdi: Option<f64>,
    pub zones: Vec<Zone>,
    pub sizing: SizingResult,
    pub scenarios: Vec<Scenario>,
    pub mode: SampleMode,
    pub requested_sample: Option<u64>,
    pub final_sample: u64,
    /// The margin of error achieved by the final sample, in percent.
    pub final_real_margin_pct: f64,
    pub zone_quotas: ZoneQuotaTable,
    pub benchmark: StratificationBenchmark,
    pub narrative: String,
}

/// Sizing output without allocation, for callers that only need the numbers.
#[derive(PartialEq, Debug, Clone)]
pub struct SizingReport {
    pub sizing: SizingResult,
    pub scenarios: Vec<Scenario>,
    pub hdi: Option<f64>,
}

/// Errors that prevent the engine from producing a result.
///
/// All of them come from inputs that violate a precondition.
#[derive(PartialEq, Debug, Clone)]
pub enum SamplingErrors {
    InvalidParameters(String),
    InvalidPopulation(String),
    InvalidConfig(String),
    /// A result failed its own consistency checks.
    InconsistentResult(String),
}

impl Error for SamplingErrors {}

impl Display for SamplingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SamplingErrors::InvalidParameters(msg) => write!(f, "invalid sampling parameters: {}", msg),
            SamplingErrors::InvalidPopulation(msg) => write!(f, "invalid population facts: {}", msg),
            SamplingErrors::InvalidConfig(msg) => write!(f, "invalid sampling configuration: {}", msg),
            SamplingErrors::InconsistentResult(msg) => write!(f, "inconsistent result: {}", msg),
        }
    }
}

// ********* Configuration **********

// Operational parameters, as commonly used by polling institutes. They can be
// tuned per institute without touching the sizing code.

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct SamplingConfig {
    /// Multiplier approximating the efficiency loss of the field design
    /// compared to simple random sampling.
    pub design_effect: f64,
    /// Expected fraction of contacts that turn into completed interviews.
    pub response_rate: f64,
    /// Minimum interviews per electoral zone.
    pub min_interviews_per_zone: u64,
    /// Minimum interviews for a municipality.
    pub municipal_floor: u64,
    /// Sample sizes are rounded up to a multiple of this value.
    pub rounding_step: u64,
}

impl SamplingConfig {
    pub const DEFAULT: SamplingConfig = SamplingConfig {
        design_effect: 1.3,
        response_rate: 0.80,
        min_interviews_per_zone: 12,
        municipal_floor: 400,
        rounding_step: 10,
    };

    pub fn validate(&self) -> Result<(), SamplingErrors> {
        if !(self.design_effect.is_finite() && self.design_effect >= 1.0) {
            return Err(SamplingErrors::InvalidConfig(format!(
                "design effect must be at least 1, got {}",
                self.design_effect
            )));
        }
        if !(self.response_rate > 0.0 && self.response_rate <= 1.0) {
            return Err(SamplingErrors::InvalidConfig(format!(
                "response rate must be in (0, 1], got {}",
                self.response_rate
            )));
        }
        if self.rounding_step == 0 {
            return Err(SamplingErrors::InvalidConfig(
                "rounding step must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        SamplingConfig::DEFAULT
    }
}

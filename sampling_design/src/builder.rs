pub use crate::config::*;

/// A builder for assembling a plan request zone by zone.
///
/// It is the simplest way to feed the engine from row-oriented sources.
///
/// ```
/// pub use sampling_design::builder::PlanBuilder;
/// pub use sampling_design::SamplingParameters;
/// # use sampling_design::SamplingErrors;
///
/// let mut builder = PlanBuilder::new("SP", "Campinas", &SamplingParameters::DEFAULT)?
///     .population(1_200_000)
///     .hdi(0.805);
///
/// builder.add_zone("0033", 250_000, 131_000, 119_000, 610)?;
/// builder.add_zone("0274", 250_000, 129_000, 121_000, 580)?;
/// builder.add_profile_record(sampling_design::ProfileDimension::Age, "25 A 34 ANOS", 92_000)?;
///
/// let plan = sampling_design::build_sampling_plan(&builder.request(), &sampling_design::SamplingConfig::DEFAULT)?;
/// assert_eq!(plan.final_sample, 500);
///
/// # Ok::<(), SamplingErrors>(())
/// ```
pub struct PlanBuilder {
    pub(crate) _municipality: Municipality,
    pub(crate) _params: SamplingParameters,
    pub(crate) _population: Option<u64>,
    pub(crate) _hdi: Option<f64>,
    pub(crate) _requested: Option<u64>,
    pub(crate) _zones: Vec<Zone>,
    pub(crate) _profile: Option<Vec<ProfileRecord>>,
}

impl PlanBuilder {
    pub fn new(uf: &str, municipality: &str, params: &SamplingParameters) -> Result<PlanBuilder, SamplingErrors> {
        let params = SamplingParameters::new(params.confidence, params.margin_of_error)?;
        Ok(PlanBuilder {
            _municipality: Municipality {
                uf: uf.trim().to_uppercase(),
                name: municipality.trim().to_string(),
            },
            _params: params,
            _population: None,
            _hdi: None,
            _requested: None,
            _zones: Vec::new(),
            _profile: None,
        })
    }

    pub fn population(self, population_total: u64) -> PlanBuilder {
        PlanBuilder {
            _population: Some(population_total),
            ..self
        }
    }

    pub fn hdi(self, hdi: f64) -> PlanBuilder {
        PlanBuilder {
            _hdi: Some(hdi),
            ..self
        }
    }

    /// Imposes the sample size instead of the recommended one.
    pub fn requested_sample(self, sample: u64) -> PlanBuilder {
        PlanBuilder {
            _requested: Some(sample),
            ..self
        }
    }

    /// Adds an electoral zone.
    ///
    /// The female and male counts may fall short of the total (electors
    /// without a declared gender) but may not exceed it.
    pub fn add_zone(
        &mut self,
        zone_id: &str,
        electors_total: u64,
        electors_female: u64,
        electors_male: u64,
        sections: u32,
    ) -> Result<(), SamplingErrors> {
        self.add_zone_2(&Zone {
            zone_id: zone_id.to_string(),
            electors_total,
            electors_female,
            electors_male,
            sections,
        })
    }

    pub fn add_zone_2(&mut self, zone: &Zone) -> Result<(), SamplingErrors> {
        if zone.electors_female + zone.electors_male > zone.electors_total {
            return Err(SamplingErrors::InvalidPopulation(format!(
                "zone {}: {} female and {} male electors out of {}",
                zone.zone_id, zone.electors_female, zone.electors_male, zone.electors_total
            )));
        }
        self._zones.push(zone.clone());
        Ok(())
    }

    /// Adds a line of the municipal profile. Adding a line with no elector is
    /// enough to mark the profile as present.
    pub fn add_profile_record(
        &mut self,
        dimension: ProfileDimension,
        raw_label: &str,
        elector_count: u64,
    ) -> Result<(), SamplingErrors> {
        self._profile.get_or_insert_with(Vec::new).push(ProfileRecord {
            dimension,
            raw_label: raw_label.to_string(),
            elector_count,
        });
        Ok(())
    }

    pub fn request(&self) -> PlanRequest {
        PlanRequest {
            municipality: self._municipality.clone(),
            zones: self._zones.clone(),
            profile: self._profile.clone(),
            population_total: self._population,
            hdi: self._hdi,
            params: self._params,
            requested_sample: self._requested,
        }
    }
}

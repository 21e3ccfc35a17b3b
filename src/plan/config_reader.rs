use crate::plan::*;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// The options of a plan, as written in a JSON configuration file.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanConfig {
    #[serde(rename = "zonesFile")]
    pub zones_file: Option<String>,
    #[serde(rename = "populationFile")]
    pub population_file: Option<String>,
    #[serde(rename = "profileFile")]
    pub profile_file: Option<String>,
    pub uf: Option<String>,
    pub municipality: Option<String>,
    pub confidence: Option<f64>,
    #[serde(rename = "marginOfError")]
    pub margin_of_error: Option<f64>,
    pub sample: Option<u64>,
    #[serde(rename = "inputType")]
    pub input_type: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "outputFile")]
    pub output_file: Option<String>,
    pub methodology: Option<MethodologySettings>,
}

/// Overrides of the operational constants of the sizing pipeline.
#[derive(PartialEq, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MethodologySettings {
    #[serde(rename = "designEffect")]
    pub design_effect: Option<f64>,
    #[serde(rename = "responseRate")]
    pub response_rate: Option<f64>,
    #[serde(rename = "minInterviewsPerZone")]
    pub min_interviews_per_zone: Option<u64>,
    #[serde(rename = "municipalFloor")]
    pub municipal_floor: Option<u64>,
    #[serde(rename = "roundingStep")]
    pub rounding_step: Option<u64>,
}

impl MethodologySettings {
    pub fn apply(&self, base: &SamplingConfig) -> SamplingConfig {
        SamplingConfig {
            design_effect: self.design_effect.unwrap_or(base.design_effect),
            response_rate: self.response_rate.unwrap_or(base.response_rate),
            min_interviews_per_zone: self
                .min_interviews_per_zone
                .unwrap_or(base.min_interviews_per_zone),
            municipal_floor: self.municipal_floor.unwrap_or(base.municipal_floor),
            rounding_step: self.rounding_step.unwrap_or(base.rounding_step),
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> PlanResult<T> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read content: {:?}", contents);
    let res: T = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(res)
}

/// Reads a plan configuration. The file paths it contains are resolved
/// against the directory of the configuration file.
pub fn read_plan_config(path: &str) -> PlanResult<PlanConfig> {
    let config: PlanConfig = read_json(path)?;
    info!("config: {:?}", config);
    let root_p = Path::new(path).parent().context(MissingParentDirSnafu {})?;
    let resolve = |p: Option<String>| -> Option<String> {
        p.map(|p| root_p.join(p).display().to_string())
    };
    Ok(PlanConfig {
        zones_file: resolve(config.zones_file),
        population_file: resolve(config.population_file),
        profile_file: resolve(config.profile_file),
        output_file: resolve(config.output_file),
        ..config
    })
}

pub fn read_methodology(path: &str) -> PlanResult<MethodologySettings> {
    let res: MethodologySettings = read_json(path)?;
    info!("methodology: {:?}", res);
    Ok(res)
}

pub fn read_summary(path: &str) -> PlanResult<JSValue> {
    read_json(path)
}

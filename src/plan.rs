mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod output;

use log::{debug, info, warn};

use sampling_design::builder::PlanBuilder;
use sampling_design::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use serde::de::DeserializeOwned;
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::plan::config_reader::*;
use crate::plan::io_common::*;

const MIN_REQUESTED_SAMPLE: u64 = 100;
const MAX_REQUESTED_SAMPLE: u64 = 10_000;

#[derive(Debug, Snafu)]
pub enum PlanError {
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Could not read line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet found in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("No worksheet named {name} in {path}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("Unexpected cell at line {lineno} of {path}: {content}"))]
    ExcelWrongCellType {
        path: String,
        lineno: usize,
        content: String,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson { source: std::io::Error, path: String },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput { source: std::io::Error, path: String },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Missing option: {name}"))]
    MissingOption { name: String },
    #[snafu(display("Municipality '{municipality}' not found in state '{uf}'"))]
    MunicipalityNotFound { uf: String, municipality: String },
    #[snafu(display("The sample size must be between 100 and 10000, got {sample}"))]
    InvalidSample { sample: u64 },
    #[snafu(display("Sampling error: {source}"))]
    Engine { source: SamplingErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type PlanResult<T> = Result<T, PlanError>;

/// The options of a run, once the configuration file and the command line
/// are merged.
#[derive(PartialEq, Debug, Clone)]
struct PlanSettings {
    zones_file: Option<String>,
    population_file: Option<String>,
    profile_file: Option<String>,
    uf: Option<String>,
    municipality: Option<String>,
    params: SamplingParameters,
    sample: Option<u64>,
    config: SamplingConfig,
    input_type: String,
    excel_worksheet_name: Option<String>,
    out: Option<String>,
}

impl PlanSettings {
    fn resolve(args: &Args, file_config: Option<PlanConfig>) -> PlanResult<PlanSettings> {
        let fc = file_config.unwrap_or_default();
        let methodology = match &args.methodology {
            Some(p) => read_methodology(p)?,
            None => fc.methodology.unwrap_or_default(),
        };
        let config = methodology.apply(&SamplingConfig::DEFAULT);
        config.validate().context(EngineSnafu {})?;

        let params = SamplingParameters::new(
            args.confidence
                .or(fc.confidence)
                .unwrap_or(SamplingParameters::DEFAULT.confidence),
            args.margin
                .or(fc.margin_of_error)
                .unwrap_or(SamplingParameters::DEFAULT.margin_of_error),
        )
        .context(EngineSnafu {})?;

        let sample = args.sample.or(fc.sample);
        if let Some(s) = sample {
            ensure!(
                (MIN_REQUESTED_SAMPLE..=MAX_REQUESTED_SAMPLE).contains(&s),
                InvalidSampleSnafu { sample: s }
            );
        }

        Ok(PlanSettings {
            zones_file: args.zones.clone().or(fc.zones_file),
            population_file: args.population.clone().or(fc.population_file),
            profile_file: args.profile.clone().or(fc.profile_file),
            uf: args.uf.clone().or(fc.uf),
            municipality: args.municipality.clone().or(fc.municipality),
            params,
            sample,
            config,
            input_type: args
                .input_type
                .clone()
                .or(fc.input_type)
                .unwrap_or_else(|| "csv".to_string()),
            excel_worksheet_name: args.excel_worksheet_name.clone().or(fc.excel_worksheet_name),
            out: args.out.clone().or(fc.output_file),
        })
    }

    fn municipality(&self) -> PlanResult<(String, String)> {
        let uf = self.uf.clone().context(MissingOptionSnafu { name: "uf" })?;
        let name = self
            .municipality
            .clone()
            .context(MissingOptionSnafu { name: "municipality" })?;
        Ok((uf, name))
    }
}

fn read_table<T: DeserializeOwned>(path: &str, settings: &PlanSettings) -> PlanResult<Vec<T>> {
    info!("Attempting to read file {:?} ({})", path, settings.input_type);
    match settings.input_type.as_str() {
        "csv" => io_csv::read_csv_table(path),
        "xlsx" | "excel" => io_excel::read_excel_table(path, settings.excel_worksheet_name.clone()),
        x => whatever!("Input type not implemented {:?}", x),
    }
}

fn read_request(settings: &PlanSettings) -> PlanResult<PlanRequest> {
    let (uf, name) = settings.municipality()?;
    let zones_file = settings
        .zones_file
        .clone()
        .context(MissingOptionSnafu { name: "zones" })?;

    let zone_rows: Vec<ZoneRow> = read_table(&zones_file, settings)?;
    let zones: Vec<Zone> = zone_rows
        .iter()
        .filter(|r| same_municipality(&uf, &name, &r.uf, &r.municipality))
        .map(zone_from_row)
        .collect();
    ensure!(
        !zones.is_empty(),
        MunicipalityNotFoundSnafu {
            uf: uf.clone(),
            municipality: name.clone()
        }
    );
    debug!("read_request: zones: {:?}", zones);

    let mut builder = PlanBuilder::new(&uf, &name, &settings.params).context(EngineSnafu {})?;
    for z in zones.iter() {
        builder.add_zone_2(z).context(EngineSnafu {})?;
    }

    if let Some(population_file) = &settings.population_file {
        let rows: Vec<PopulationRow> = read_table(population_file, settings)?;
        match rows
            .iter()
            .find(|r| same_municipality(&uf, &name, &r.uf, &r.municipality))
        {
            Some(r) => {
                if let Some(p) = r.population_total {
                    builder = builder.population(p);
                }
                if let Some(hdi) = r.hdi {
                    builder = builder.hdi(hdi);
                }
            }
            None => warn!(
                "{} ({}) not found in the population table, using the electorate",
                name, uf
            ),
        }
    }

    if let Some(profile_file) = &settings.profile_file {
        let rows: Vec<ProfileRow> = read_table(profile_file, settings)?;
        let mut count = 0;
        for r in rows
            .iter()
            .filter(|r| same_municipality(&uf, &name, &r.uf, &r.municipality))
        {
            match parse_dimension(&r.dimension) {
                Some(d) => {
                    builder
                        .add_profile_record(d, &r.category, r.elector_count)
                        .context(EngineSnafu {})?;
                    count += 1;
                }
                None => warn!("Skipping profile line with unknown dimension {:?}", r.dimension),
            }
        }
        info!("Read {} profile lines for {} ({})", count, name, uf);
    }

    if let Some(s) = settings.sample {
        builder = builder.requested_sample(s);
    }
    Ok(builder.request())
}

fn run_listing(args: &Args, settings: &PlanSettings) -> PlanResult<JSValue> {
    let population_file = settings
        .population_file
        .clone()
        .context(MissingOptionSnafu { name: "population" })?;
    let rows: Vec<PopulationRow> = read_table(&population_file, settings)?;
    if args.list_ufs {
        Ok(json!({ "ufs": list_ufs(&rows) }))
    } else {
        let municipalities: Vec<JSValue> = list_municipalities(&rows, settings.uf.as_deref())
            .iter()
            .map(|(uf, name)| json!({"uf": uf, "municipality": name}))
            .collect();
        Ok(json!({ "municipalities": municipalities }))
    }
}

/// Runs the command line: computes a plan (or a listing) and writes it out.
pub fn run_plan(args: &Args) -> PlanResult<()> {
    let file_config = match &args.config {
        Some(p) => Some(read_plan_config(p)?),
        None => None,
    };
    let settings = PlanSettings::resolve(args, file_config)?;
    info!("settings: {:?}", settings);

    let result_js = if args.list_ufs || args.list_municipalities {
        run_listing(args, &settings)?
    } else {
        let request = read_request(&settings)?;
        if args.sizing_only {
            let report = size_municipality(&request, &settings.config).context(EngineSnafu {})?;
            output::sizing_report_to_json(&request, &report)
        } else {
            let plan = build_sampling_plan(&request, &settings.config).context(EngineSnafu {})?;
            output::plan_to_json(&plan)
        }
    };

    let pretty_js = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    match settings.out.as_deref() {
        None | Some("stdout") | Some("") => println!("{}", pretty_js),
        Some(path) => {
            info!("Writing output to {:?}", path);
            fs::write(path, &pretty_js).context(WritingOutputSnafu { path })?;
        }
    }

    // The reference plan, if provided for comparison
    if let Some(reference_p) = &args.reference {
        check_reference(&pretty_js, reference_p)?;
    }
    Ok(())
}

fn check_reference(pretty_js: &str, reference_path: &str) -> PlanResult<()> {
    let reference = read_summary(reference_path)?;
    let pretty_js_reference = serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
    if pretty_js_reference != pretty_js {
        warn!("Found differences with the reference plan");
        print_diff(pretty_js_reference.as_str(), pretty_js, "\n");
        whatever!("Difference detected between the computed plan and the reference plan")
    }
    Ok(())
}

use clap::Parser;

/// This is a sampling plan generator for municipal opinion polls.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file with the options of the plan. File paths inside are relative to
    /// the location of this file. Options given on the command line take precedence.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The electorate of every electoral zone (TSE table).
    #[clap(short, long, value_parser)]
    pub zones: Option<String>,

    /// (file path, optional) The population and human development index of the municipalities (IBGE table).
    #[clap(short, long, value_parser)]
    pub population: Option<String>,

    /// (file path, optional) The detailed profile of the electorate (education, age group).
    #[clap(long, value_parser)]
    pub profile: Option<String>,

    /// The two-letter code of the state.
    #[clap(long, value_parser)]
    pub uf: Option<String>,

    /// The name of the municipality (not case sensitive).
    #[clap(short, long, value_parser)]
    pub municipality: Option<String>,

    /// (default 0.95) The confidence level: 0.90, 0.95 or 0.99.
    #[clap(long, value_parser)]
    pub confidence: Option<f64>,

    /// (default 0.05) The maximum margin of error, as a fraction.
    #[clap(long, value_parser)]
    pub margin: Option<f64>,

    /// (100 to 10000, optional) Imposes the number of interviews instead of the recommended one. It is
    /// raised to the Cochran minimum if needed.
    #[clap(short, long, value_parser)]
    pub sample: Option<u64>,

    /// (file path, optional) A JSON file overriding the operational constants (design effect, response
    /// rate, floors, rounding step).
    #[clap(long, value_parser)]
    pub methodology: Option<String>,

    /// If passed as an argument, only the sample size and the scenarios are computed.
    #[clap(long, takes_value = false)]
    pub sizing_only: bool,

    /// If passed as an argument, lists the states of the population table.
    #[clap(long, takes_value = false)]
    pub list_ufs: bool,

    /// If passed as an argument, lists the municipalities of the population table (of the state given
    /// with --uf, if any).
    #[clap(long, takes_value = false)]
    pub list_municipalities: bool,

    /// (default csv) The type of the input files: csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: first worksheet) When using Excel files, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the plan will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing a plan in JSON format. If provided, sampleplan will
    /// check that the computed output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}

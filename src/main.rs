mod args;
mod plan;

use clap::Parser;
use log::{debug, warn};

fn main() {
    let args = args::Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
    debug!("args: {:?}", args);

    if let Err(e) = plan::run_plan(&args) {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured: {}", e);
        std::process::exit(1);
    }
}

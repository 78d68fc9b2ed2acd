//! checkconfig
//!
//! Loads a primary config and its job fragments through the same pipeline
//! the controllers use, and reports either a summary or the first error.

mod cli;
mod error;
mod logging;
mod summary;

use clap::Parser;
use colored::Colorize;

use cli::Cli;
use error::Result;
use logging::Logging;
use summary::Summary;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let logging = Logging::init(cli.verbose)?;
    tracing::debug!(config = %cli.config_path.display(), "Checking config");

    let config = jobconf_core::load(&cli.config_path, cli.job_config_path.as_deref())?;
    logging.apply(config.log_level())?;

    let summary = Summary::of(&config);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{summary}");
    }
    Ok(())
}

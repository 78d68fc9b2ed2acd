//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::Parser;

/// Load a job configuration and report whether it is valid
#[derive(Parser, Debug)]
#[command(name = "checkconfig")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the primary config file
    #[arg(long, env = "JOBCONF_CONFIG_PATH", default_value = "/etc/config/config.yaml")]
    pub config_path: PathBuf,

    /// Path to a job fragment or a directory of fragments
    #[arg(long, env = "JOBCONF_JOB_CONFIG_PATH")]
    pub job_config_path: Option<PathBuf>,

    /// Log at debug level regardless of the configured level
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

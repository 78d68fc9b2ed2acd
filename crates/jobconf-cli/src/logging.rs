//! Log subscriber setup
//!
//! The subscriber starts at WARN (or DEBUG with `--verbose`) and is switched
//! to the loaded configuration's level once a load succeeds. `RUST_LOG`
//! directives take precedence over both.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

use crate::error::{CliError, Result};

pub struct Logging {
    handle: reload::Handle<EnvFilter, Registry>,
    verbose: bool,
}

impl Logging {
    /// Install the global subscriber
    pub fn init(verbose: bool) -> Result<Self> {
        let (filter, handle) = reload::Layer::new(filter_for(bootstrap_level(verbose)));
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
            .map_err(CliError::logging)?;
        Ok(Self { handle, verbose })
    }

    /// Switch to the configured level unless `--verbose` pinned DEBUG
    pub fn apply(&self, configured: LevelFilter) -> Result<()> {
        if self.verbose {
            return Ok(());
        }
        self.handle
            .reload(filter_for(configured))
            .map_err(CliError::logging)?;
        tracing::debug!(level = %configured, "Applied configured log level");
        Ok(())
    }
}

fn bootstrap_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    }
}

fn filter_for(level: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_level() {
        assert_eq!(bootstrap_level(true), LevelFilter::DEBUG);
        assert_eq!(bootstrap_level(false), LevelFilter::WARN);
    }
}

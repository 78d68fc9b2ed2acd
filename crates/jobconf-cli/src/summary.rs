//! What a successful check reports

use std::fmt;

use colored::Colorize;
use jobconf_core::Config;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub repos: Vec<String>,
    pub presubmits: usize,
    pub postsubmits: usize,
    pub periodics: usize,
    pub presets: usize,
}

impl Summary {
    pub fn of(config: &Config) -> Self {
        Self {
            repos: config.all_repos().iter().cloned().collect(),
            presubmits: config.all_presubmits().count(),
            postsubmits: config.all_postsubmits().count(),
            periodics: config.periodics().len(),
            presets: config.presets().len(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} configuration is valid", "ok".green().bold())?;
        writeln!(f, "  repos:       {}", self.repos.len())?;
        writeln!(f, "  presubmits:  {}", self.presubmits)?;
        writeln!(f, "  postsubmits: {}", self.postsubmits)?;
        writeln!(f, "  periodics:   {}", self.periodics)?;
        write!(f, "  presets:     {}", self.presets)
    }
}

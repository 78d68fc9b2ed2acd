//! Settings for the job-running controller

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::check_template;
use crate::decoration::DecorationConfig;
use crate::duration::Duration;
use crate::error::{Error, Result};
use crate::jobs::Refs;

const DEFAULT_MAX_GOROUTINES: i64 = 20;

/// Wildcard key for defaults that apply to every repository
pub const WILDCARD: &str = "*";

/// Settings common to every agent-specific controller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controller {
    /// Template for the job details link
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub job_url_template: String,

    /// Template for the blurb appended to failure reports
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub report_template: String,

    /// Jobs allowed to run at once; zero means unlimited
    #[serde(default)]
    pub max_concurrency: i64,

    #[serde(default)]
    pub max_goroutines: i64,

    #[serde(default)]
    pub allow_cancellations: bool,
}

impl Controller {
    pub(crate) fn default_and_validate(&mut self) -> std::result::Result<(), String> {
        check_template(&self.job_url_template).map_err(|e| format!("parsing template: {e}"))?;
        check_template(&self.report_template).map_err(|e| format!("parsing template: {e}"))?;

        if self.max_concurrency < 0 {
            return Err(format!(
                "controller has invalid max_concurrency ({}), it needs to be a non-negative number",
                self.max_concurrency
            ));
        }
        if self.max_goroutines == 0 {
            self.max_goroutines = DEFAULT_MAX_GOROUTINES;
        }
        if self.max_goroutines <= 0 {
            return Err(format!(
                "controller has invalid max_goroutines ({}), it needs to be a positive number",
                self.max_goroutines
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plank {
    #[serde(flatten)]
    pub controller: Controller,

    /// How long a pod may stay pending; defaults to one day
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_pending_timeout: Option<Duration>,

    /// How long a pod may run; defaults to two days
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_running_timeout: Option<Duration>,

    /// Deprecated single default, promoted to the wildcard entry at load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_decoration_config: Option<DecorationConfig>,

    /// Decoration defaults keyed by `org/repo`, `org` or `*`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub default_decoration_configs: BTreeMap<String, DecorationConfig>,

    /// Job details link prefixes keyed by `org/repo`, `org` or `*`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub job_url_prefix_config: BTreeMap<String, String>,
}

impl Plank {
    pub(crate) fn default_and_validate(&mut self) -> Result<()> {
        self.controller
            .default_and_validate()
            .map_err(|message| Error::controller("plank", message))?;

        self.pod_pending_timeout
            .get_or_insert(Duration::from_hours(24));
        self.pod_running_timeout
            .get_or_insert(Duration::from_hours(48));
        Ok(())
    }

    /// The decoration defaults for `repo`
    ///
    /// An exact `org/repo` entry wins over an `org` entry. Either is layered
    /// over the wildcard entry, which is also the fallback.
    pub fn default_decoration_config_for(&self, repo: &str) -> Option<DecorationConfig> {
        let wildcard = self.default_decoration_configs.get(WILDCARD);
        let org = repo.split('/').next().unwrap_or_default();

        let specific = self
            .default_decoration_configs
            .get(repo)
            .or_else(|| self.default_decoration_configs.get(org));

        match (specific, wildcard) {
            (Some(specific), Some(wildcard)) => Some(specific.apply_default(wildcard)),
            (Some(specific), None) => Some(specific.clone()),
            (None, wildcard) => wildcard.cloned(),
        }
    }

    /// The job details link prefix for a job checking out `refs`
    pub fn job_url_prefix(&self, refs: Option<&Refs>) -> &str {
        let lookup = |key: &str| {
            self.job_url_prefix_config
                .get(key)
                .map(String::as_str)
                .filter(|prefix| !prefix.is_empty())
        };

        refs.and_then(|refs| lookup(&refs.org_repo()).or_else(|| lookup(&refs.org)))
            .or_else(|| lookup(WILDCARD))
            .unwrap_or_default()
    }

    /// Settle the decoration defaults before any job is decorated
    ///
    /// Promotes the deprecated single default to the wildcard entry and
    /// requires a valid wildcard entry to exist.
    pub(crate) fn finalize_decoration_defaults(&mut self) -> Result<()> {
        if let Some(deprecated) = self.default_decoration_config.take() {
            if !self.default_decoration_configs.is_empty() {
                self.default_decoration_config = Some(deprecated);
                return Err(Error::ConflictingDecorationDefaults);
            }
            tracing::warn!(
                "default_decoration_config is deprecated, use default_decoration_configs['*'] instead"
            );
            self.default_decoration_configs
                .insert(WILDCARD.to_string(), deprecated);
        }

        let wildcard = self
            .default_decoration_configs
            .get(WILDCARD)
            .ok_or(Error::MissingWildcardDecoration)?;
        wildcard.validate().map_err(Error::InvalidDefaultDecoration)
    }
}

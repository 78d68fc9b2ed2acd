use serde::{Deserialize, Serialize};

use super::JobBase;
use crate::duration::Duration;

/// A job that runs on a schedule
///
/// Exactly one of `cron` and `interval` must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Periodic {
    #[serde(flatten)]
    pub base: JobBase,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cron: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub interval: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(skip)]
    pub(crate) interval_duration: Option<Duration>,
}

impl Periodic {
    pub fn name(&self) -> &str {
        &self.base.name
    }

    /// The parsed interval, available once the config has been validated
    pub fn interval(&self) -> Option<Duration> {
        self.interval_duration
    }

    /// `org/repo` of the first extra checkout, used to pick decoration defaults
    pub fn decoration_repo(&self) -> String {
        self.base
            .utility_config
            .extra_refs
            .first()
            .map(|refs| refs.org_repo())
            .unwrap_or_default()
    }
}

//! The job portion of a configuration and the fragment merger

use std::collections::{BTreeMap, BTreeSet};

use jobconf_fs::{ConfigStore, RawDocument, SourcePath};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::jobs::{Periodic, Postsubmit, Presubmit};
use crate::preset::{Preset, check_unique_label_pairs};

/// Presets and jobs, with change-scoped jobs keyed by `org/repo`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub presets: Vec<Preset>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub presubmits: BTreeMap<String, Vec<Presubmit>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub postsubmits: BTreeMap<String, Vec<Postsubmit>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub periodics: Vec<Periodic>,
}

impl JobConfig {
    /// Decode one fragment, recording it as the source of each job
    pub fn from_document(store: &ConfigStore, doc: &RawDocument) -> Result<Self> {
        let mut config: JobConfig = store.decode(doc)?;
        config.set_source_path(&doc.source);
        Ok(config)
    }

    pub(crate) fn set_source_path(&mut self, source: &SourcePath) {
        for job in self.presubmits.values_mut().flatten() {
            job.base.source_path = source.clone();
        }
        for job in self.postsubmits.values_mut().flatten() {
            job.base.source_path = source.clone();
        }
        for job in &mut self.periodics {
            job.base.source_path = source.clone();
        }
    }

    /// Combine two job configs
    ///
    /// Presets and periodics are concatenated, and change-scoped jobs are
    /// appended per repository with `self` first. The result is rejected if
    /// the combined presets repeat a `label:value` pair.
    pub fn merge(mut self, other: JobConfig) -> Result<JobConfig> {
        self.presets.extend(other.presets);
        check_unique_label_pairs(&self.presets)?;

        self.periodics.extend(other.periodics);
        for (repo, jobs) in other.presubmits {
            self.presubmits.entry(repo).or_default().extend(jobs);
        }
        for (repo, jobs) in other.postsubmits {
            self.postsubmits.entry(repo).or_default().extend(jobs);
        }
        Ok(self)
    }

    /// True if any job asks for its pod to be decorated
    pub fn decoration_requested(&self) -> bool {
        self.presubmits.values().flatten().any(|j| j.base.decorates())
            || self.postsubmits.values().flatten().any(|j| j.base.decorates())
            || self.periodics.iter().any(|j| j.base.decorates())
    }

    /// Every repository with at least one presubmit or postsubmit
    pub fn repos(&self) -> BTreeSet<String> {
        self.presubmits
            .keys()
            .chain(self.postsubmits.keys())
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
            && self.presubmits.values().all(Vec::is_empty)
            && self.postsubmits.values().all(Vec::is_empty)
            && self.periodics.is_empty()
    }
}

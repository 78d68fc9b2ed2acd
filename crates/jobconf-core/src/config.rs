//! Configuration loading
//!
//! [`load`] turns a primary document and an optional fragment tree into a
//! validated [`Config`] snapshot. The stages run in a fixed order:
//!
//! 1. decode the primary document, then default and validate controllers
//! 2. read and merge job fragments
//! 3. run the default cascade and compile matchers
//! 4. validate cross-component settings
//! 5. validate jobs
//!
//! A failure at any stage, including an unexpected panic, is returned as an
//! error and no snapshot is produced.

use std::collections::BTreeSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use jobconf_fs::{ConfigStore, FragmentSource, FsFragmentSource, RawDocument, SourcePath};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::defaults::finalize_job_config;
use crate::error::{Error, Result};
use crate::job_config::JobConfig;
use crate::jobs::{Periodic, Postsubmit, Presubmit};
use crate::preset::Preset;
use crate::prow::ProwConfig;
use crate::validate::validate_job_config;

/// A fully resolved, validated configuration
///
/// Produced only by a successful load and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Config {
    #[serde(flatten)]
    job_config: JobConfig,

    #[serde(flatten)]
    prow_config: ProwConfig,

    #[serde(skip)]
    all_repos: BTreeSet<String>,
}

impl Config {
    /// Load from disk; see [`load`]
    pub fn load(prow_config: impl AsRef<Path>, job_config: Option<&Path>) -> Result<Self> {
        load(prow_config, job_config)
    }

    pub fn job_config(&self) -> &JobConfig {
        &self.job_config
    }

    pub fn prow_config(&self) -> &ProwConfig {
        &self.prow_config
    }

    /// Presubmits configured for `repo` (`org/repo`)
    pub fn presubmits(&self, repo: &str) -> &[Presubmit] {
        self.job_config
            .presubmits
            .get(repo)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Postsubmits configured for `repo` (`org/repo`)
    pub fn postsubmits(&self, repo: &str) -> &[Postsubmit] {
        self.job_config
            .postsubmits
            .get(repo)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn all_presubmits(&self) -> impl Iterator<Item = &Presubmit> {
        self.job_config.presubmits.values().flatten()
    }

    pub fn all_postsubmits(&self) -> impl Iterator<Item = &Postsubmit> {
        self.job_config.postsubmits.values().flatten()
    }

    pub fn periodics(&self) -> &[Periodic] {
        &self.job_config.periodics
    }

    pub fn presets(&self) -> &[Preset] {
        &self.job_config.presets
    }

    /// Every repository with at least one change-scoped job
    pub fn all_repos(&self) -> &BTreeSet<String> {
        &self.all_repos
    }

    /// True if any job tied to `repo` has decoration turned on
    ///
    /// Periodics are tied to the repository of their first extra checkout.
    pub fn is_decoration_enabled(&self, repo: &str) -> bool {
        self.presubmits(repo).iter().any(|j| j.base.decorates())
            || self.postsubmits(repo).iter().any(|j| j.base.decorates())
            || self
                .periodics()
                .iter()
                .any(|j| j.base.decorates() && j.decoration_repo() == repo)
    }

    /// True if job definitions stored in `identifier` itself are honored
    pub fn in_repo_config_enabled(&self, identifier: &str) -> bool {
        self.prow_config.in_repo_config.enabled_for(identifier)
    }

    /// The configured log level, for the caller to apply
    pub fn log_level(&self) -> LevelFilter {
        self.prow_config.log_level()
    }
}

/// The primary document: controller settings plus any inline jobs
#[derive(Deserialize)]
struct PrimaryDocument {
    #[serde(flatten)]
    job_config: JobConfig,

    #[serde(flatten)]
    prow_config: ProwConfig,
}

/// Load and validate a configuration from disk
///
/// `prow_config` must name a file. `job_config`, when given, names a single
/// fragment or a directory tree of fragments.
pub fn load(prow_config: impl AsRef<Path>, job_config: Option<&Path>) -> Result<Config> {
    load_with(&FsFragmentSource::new(), prow_config.as_ref(), job_config)
}

/// Load using `source` to enumerate job fragments
pub fn load_with(
    source: &impl FragmentSource,
    prow_config: &Path,
    job_config: Option<&Path>,
) -> Result<Config> {
    contain_panics(|| {
        if prow_config.is_dir() {
            return Err(Error::PrimaryConfigIsDir {
                path: prow_config.to_path_buf(),
            });
        }
        let primary = RawDocument::read(&SourcePath::from(prow_config))?;
        let fragments = match job_config {
            Some(path) => source.load_fragments(&SourcePath::from(path))?,
            None => Vec::new(),
        };
        resolve(primary, fragments)
    })
}

/// Resolve already-retrieved documents
///
/// Fragments are merged in the order given.
pub fn from_documents(primary: RawDocument, fragments: Vec<RawDocument>) -> Result<Config> {
    contain_panics(|| resolve(primary, fragments))
}

/// Read and merge job fragments without defaulting or validating them
pub fn read_job_config(path: impl AsRef<Path>) -> Result<JobConfig> {
    read_job_config_with(&FsFragmentSource::new(), path.as_ref())
}

pub fn read_job_config_with(source: &impl FragmentSource, path: &Path) -> Result<JobConfig> {
    let store = ConfigStore::new();
    source
        .load_fragments(&SourcePath::from(path))?
        .iter()
        .try_fold(JobConfig::default(), |merged, doc| {
            merged.merge(JobConfig::from_document(&store, doc)?)
        })
}

fn resolve(primary: RawDocument, fragments: Vec<RawDocument>) -> Result<Config> {
    let store = ConfigStore::new();

    let PrimaryDocument {
        mut job_config,
        mut prow_config,
    } = store.decode(&primary)?;
    job_config.set_source_path(&primary.source);
    prow_config.default_and_validate()?;
    tracing::debug!(source = %primary.source, "Loaded controller config");

    for doc in &fragments {
        job_config = job_config.merge(JobConfig::from_document(&store, doc)?)?;
    }
    tracing::debug!(fragments = fragments.len(), "Merged job fragments");

    finalize_job_config(&mut job_config, &mut prow_config)?;
    prow_config.validate_components()?;
    validate_job_config(&mut job_config, &prow_config.pod_namespace)?;

    let all_repos = job_config.repos();
    tracing::debug!(repos = all_repos.len(), "Configuration validated");
    Ok(Config {
        job_config,
        prow_config,
        all_repos,
    })
}

/// Convert a panic during load into an error
fn contain_panics<T>(load: impl FnOnce() -> Result<T>) -> Result<T> {
    catch_unwind(AssertUnwindSafe(load)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        tracing::error!(%message, "Panic while loading config");
        Err(Error::Panic { message })
    })
}

//! Error types for jobconf-core
//!
//! [`Error`] is what a load returns. Each variant maps to one stage of the
//! pipeline, and job-scoped variants carry the job kind and name so a failure
//! can be traced to the fragment that defined it. [`JobError`] is the rule a
//! single job violated.

use std::path::PathBuf;

use crate::duration::DurationError;
use crate::jobs::ProwJobType;

/// Result type for jobconf-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving a configuration
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading or decoding a document failed
    #[error(transparent)]
    Fs(#[from] jobconf_fs::Error),

    /// The primary config path names a directory
    #[error("prow config cannot be a dir - {path}")]
    PrimaryConfigIsDir { path: PathBuf },

    /// Two presets share an identical label pair
    #[error("duplicated preset 'label:value' pair : {pair}")]
    DuplicatePresetLabel { pair: String },

    /// Both the deprecated and the keyed decoration defaults are set
    #[error("both default_decoration_config and default_decoration_configs are specified")]
    ConflictingDecorationDefaults,

    /// Decoration is requested but no wildcard default exists
    #[error("default_decoration_configs['*'] is missing")]
    MissingWildcardDecoration,

    /// The wildcard decoration default does not validate
    #[error("decoration config validation error: {0}")]
    InvalidDefaultDecoration(#[source] DecorationError),

    /// Injecting a preset into a job's pod spec failed
    #[error("job {job} failed to merge presets for podspec: {source}")]
    Preset {
        job: String,
        #[source]
        source: PresetError,
    },

    /// A trigger, branch or change pattern did not compile
    #[error("could not set regexes for {job}: {source}")]
    Compile {
        job: String,
        #[source]
        source: PatternError,
    },

    /// A presubmit's rerun command would never re-trigger it
    #[error("for job {job}, rerun command \"{rerun_command}\" does not match trigger \"{trigger}\"")]
    RerunCommandMismatch {
        job: String,
        rerun_command: String,
        trigger: String,
    },

    /// Two jobs of the same kind and name have overlapping scope
    #[error("duplicated {kind} job: {name}")]
    DuplicatedJob { kind: ProwJobType, name: String },

    /// A job violates a validation rule
    #[error("invalid {kind} job {name}: {source}")]
    InvalidJob {
        kind: ProwJobType,
        name: String,
        #[source]
        source: JobError,
    },

    /// Controller-level configuration is invalid
    #[error("invalid {component} config: {message}")]
    Controller {
        component: &'static str,
        message: String,
    },

    /// An unexpected fault during load, contained at the load boundary
    #[error("panic loading config: {message}")]
    Panic { message: String },
}

impl Error {
    pub(crate) fn controller(component: &'static str, message: impl Into<String>) -> Self {
        Self::Controller {
            component,
            message: message.into(),
        }
    }
}

/// A rule violated by a single job
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JobError {
    #[error("name: must match regex {pattern:?}")]
    InvalidName { pattern: &'static str },

    #[error("max_concurrency: {0} must be a non-negative number")]
    NegativeConcurrency(i64),

    #[error("job specs require agent: kubernetes (found {found:?})")]
    SpecRequiresKubernetes { found: String },

    #[error("kubernetes jobs require a spec")]
    MissingSpec,

    #[error("decoration requires agent: kubernetes or knative-build (found {found:?})")]
    DecorationAgent { found: String },

    #[error("error_on_eviction only applies to agent: kubernetes (found {found:?})")]
    ErrorOnEviction { found: String },

    #[error("failed to default namespace")]
    MissingNamespace,

    #[error("namespace customization requires agent: knative-build or tekton-pipeline (found {found:?})")]
    NamespaceAgent { found: String },

    #[error("pod spec may not use init containers")]
    InitContainers,

    #[error("pod spec must specify exactly 1 container, found: {0}")]
    ContainerCount(usize),

    #[error("invalid label {label}: {reason}")]
    InvalidLabelKey { label: String, reason: String },

    #[error("label {label} has invalid value {value}: {reason}")]
    InvalidLabelValue {
        label: String,
        value: String,
        reason: String,
    },

    #[error("allow anyone is set to true and permitted users or groups are specified")]
    AmbiguousRerunAuth,

    #[error("invalid decoration config: {0}")]
    Decoration(#[source] DecorationError),

    #[error("decorated job containers must specify command and/or args")]
    DecoratedWithoutCommand,

    #[error("job is set to always run but also declares run_if_changed targets, which are mutually exclusive")]
    AlwaysRunWithChanges,

    #[error("job is set to report but has no context configured")]
    MissingContext,

    #[error("either both of trigger and rerun_command must be set, or neither")]
    TriggerWithoutRerunCommand,

    #[error("cron and interval cannot be both set")]
    CronAndInterval,

    #[error("cron and interval cannot be both empty")]
    NoSchedule,

    #[error("cannot parse duration for interval: {0}")]
    InvalidInterval(#[source] DurationError),
}

/// A decoration config is incomplete or inconsistent
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecorationError {
    #[error("utility image config is not specified")]
    MissingUtilityImages,

    #[error("the following utility images are not specified: {0:?}")]
    MissingImages(Vec<&'static str>),

    #[error("GCS upload configuration is not specified")]
    MissingGcsConfiguration,

    #[error("GCS upload credential secret is not specified")]
    MissingGcsCredentials,

    #[error("GCS configuration is invalid: gcs_path_strategy must be one of \"legacy\", \"single\", or \"explicit\" (found {0:?})")]
    InvalidPathStrategy(String),

    #[error("GCS configuration is invalid: default org and repo must be provided for GCS strategy {0:?}")]
    MissingDefaultOrgRepo(String),
}

/// A preset conflicts with a job's pod spec
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresetError {
    #[error("env var duplicated in pod spec: {0}")]
    DuplicateEnv(String),

    #[error("volume mount duplicated in pod spec: {0}")]
    DuplicateVolumeMount(String),
}

/// A configured pattern failed to compile
#[derive(Debug, Clone, thiserror::Error)]
#[error("could not compile {what} regex: {source}")]
pub struct PatternError {
    pub what: &'static str,
    #[source]
    pub source: regex::Error,
}

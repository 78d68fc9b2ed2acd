//! Job configuration resolution engine
//!
//! Builds a validated configuration snapshot from a primary document of
//! controller settings plus a tree of job fragments:
//!
//! - **Merge**: fragments are combined, rejecting duplicate presets and jobs
//! - **Defaults**: decoration defaults per repository, presets, agent,
//!   namespace, cluster, status context and trigger
//! - **Matchers**: triggers, branch filters and change filters are compiled
//! - **Validation**: every job and controller section is checked before a
//!   snapshot is handed out
//!
//! # Architecture
//!
//! ```text
//!          checkconfig / consumers
//!                    |
//!               jobconf-core
//!                    |
//!               jobconf-fs
//! ```
//!
//! # Example
//!
//! ```ignore
//! use jobconf_core::load;
//!
//! let config = load("/etc/config/config.yaml", Some("/etc/job-config".as_ref()))?;
//! for job in config.presubmits("org/repo") {
//!     println!("{}", job.name());
//! }
//! ```

pub mod agent;
pub mod brancher;
pub mod config;
pub mod decoration;
pub mod defaults;
pub mod duration;
pub mod error;
pub mod job_config;
pub mod jobs;
pub mod labels;
pub mod matcher;
pub mod pod;
pub mod preset;
pub mod prow;
pub mod validate;

pub use agent::ConfigAgent;
pub use brancher::{Brancher, RegexpChangeMatcher};
pub use config::{Config, from_documents, load, load_with, read_job_config, read_job_config_with};
pub use decoration::{DecorationConfig, GcsConfiguration, UtilityImages};
pub use duration::{Duration, DurationError, parse_duration};
pub use error::{DecorationError, Error, JobError, PatternError, PresetError, Result};
pub use job_config::JobConfig;
pub use jobs::{
    Agent, JobBase, Periodic, Postsubmit, Presubmit, ProwJobType, Refs, RerunAuthConfig, Reporter,
    UtilityConfig,
};
pub use matcher::{Matcher, default_rerun_command_for, default_trigger_for};
pub use pod::{Container, EnvVar, PodSpec, Volume, VolumeMount};
pub use preset::Preset;
pub use prow::{ProwConfig, parse_log_level};

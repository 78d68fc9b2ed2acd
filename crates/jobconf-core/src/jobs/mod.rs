//! Job definitions
//!
//! Every job kind embeds a [`JobBase`] holding the fields common to all jobs.
//! The base, and the utility settings inside it, are flattened so a job is
//! written as one mapping in YAML.

mod periodic;
mod postsubmit;
mod presubmit;

pub use periodic::Periodic;
pub use postsubmit::Postsubmit;
pub use presubmit::Presubmit;

use std::collections::BTreeMap;
use std::fmt;

use jobconf_fs::SourcePath;
use serde::{Deserialize, Serialize};

use crate::decoration::DecorationConfig;
use crate::pod::PodSpec;

/// The kind of job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProwJobType {
    Presubmit,
    Postsubmit,
    Periodic,
    Batch,
}

impl fmt::Display for ProwJobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Presubmit => write!(f, "presubmit"),
            Self::Postsubmit => write!(f, "postsubmit"),
            Self::Periodic => write!(f, "periodic"),
            Self::Batch => write!(f, "batch"),
        }
    }
}

/// The executor a job runs on
///
/// Unrecognized names are kept as written rather than rejected at parse time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Agent {
    #[default]
    Kubernetes,
    KnativeBuild,
    Jenkins,
    TektonPipeline,
    Other(String),
}

impl Agent {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Kubernetes => "kubernetes",
            Self::KnativeBuild => "knative-build",
            Self::Jenkins => "jenkins",
            Self::TektonPipeline => "tekton-pipeline",
            Self::Other(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    pub fn supports_decoration(&self) -> bool {
        matches!(self, Self::Kubernetes | Self::KnativeBuild)
    }

    pub fn supports_custom_namespace(&self) -> bool {
        matches!(self, Self::KnativeBuild | Self::TektonPipeline)
    }
}

impl From<String> for Agent {
    fn from(value: String) -> Self {
        match value.as_str() {
            "kubernetes" => Self::Kubernetes,
            "knative-build" => Self::KnativeBuild,
            "jenkins" => Self::Jenkins,
            "tekton-pipeline" => Self::TektonPipeline,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for Agent {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Agent> for String {
    fn from(value: Agent) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields shared by every job kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobBase {
    pub name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    /// Concurrent runs allowed; zero means unlimited
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_concurrency: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<Agent>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error_on_eviction: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<PodSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rerun_auth_config: Option<RerunAuthConfig>,

    #[serde(flatten)]
    pub utility_config: UtilityConfig,

    /// The document this job was read from
    #[serde(skip)]
    pub source_path: SourcePath,
}

impl JobBase {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The agent, or the default agent if none is configured
    pub fn agent(&self) -> Agent {
        self.agent.clone().unwrap_or_default()
    }

    pub fn decorates(&self) -> bool {
        self.utility_config.decorate
    }
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Settings for the utility containers wrapped around a decorated pod
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UtilityConfig {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub decorate: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_alias: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_uri: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skip_submodules: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_depth: Option<u32>,

    /// Additional repositories to check out
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_refs: Vec<Refs>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decoration_config: Option<DecorationConfig>,
}

/// A repository checkout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refs {
    pub org: String,
    pub repo: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base_ref: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base_sha: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_alias: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_uri: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skip_submodules: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_depth: Option<u32>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub workdir: bool,
}

impl Refs {
    pub fn new(org: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            repo: repo.into(),
            ..Self::default()
        }
    }

    /// `org/repo`
    pub fn org_repo(&self) -> String {
        format!("{}/{}", self.org, self.repo)
    }
}

/// Who may re-run a job from the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerunAuthConfig {
    #[serde(default)]
    pub allow_anyone: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub github_users: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub github_team_ids: Vec<i64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub github_team_slugs: Vec<GitHubTeamSlug>,
}

impl RerunAuthConfig {
    /// True if anyone is allowed while specific users or teams are also listed
    pub fn is_ambiguous(&self) -> bool {
        self.allow_anyone
            && (!self.github_users.is_empty()
                || !self.github_team_ids.is_empty()
                || !self.github_team_slugs.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubTeamSlug {
    pub slug: String,
    pub org: String,
}

/// How a change-scoped job reports its status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reporter {
    /// Status context; defaults to the job name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skip_report: bool,
}

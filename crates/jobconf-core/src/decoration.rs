//! Decoration configuration
//!
//! A decorated job has its pod wrapped with utility containers that clone
//! sources, upload artifacts and enforce timeouts. Every field is optional so
//! a job can override a handful of values and inherit the rest from the
//! defaults configured for its repository.

use serde::{Deserialize, Serialize};

use crate::duration::Duration;
use crate::error::DecorationError;

/// Artifact upload layouts
pub const PATH_STRATEGY_LEGACY: &str = "legacy";
pub const PATH_STRATEGY_SINGLE: &str = "single";
pub const PATH_STRATEGY_EXPLICIT: &str = "explicit";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecorationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_period: Option<Duration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utility_images: Option<UtilityImages>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcs_configuration: Option<GcsConfiguration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcs_credentials_secret: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ssh_key_secrets: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ssh_host_fingerprints: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_cloning: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookiefile_secret: Option<String>,
}

/// Container images for the decoration utilities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilityImages {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clonerefs: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initupload: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidecar: Option<String>,
}

/// Where and how job artifacts are uploaded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcsConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_strategy: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_org: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_repo: Option<String>,
}

impl DecorationConfig {
    /// Fill every unset field of `self` from `def`
    ///
    /// Fields set on `self` always win. Neither input is modified.
    pub fn apply_default(&self, def: &DecorationConfig) -> DecorationConfig {
        // Destructured so that adding a field fails to compile until it is merged here.
        let DecorationConfig {
            timeout,
            grace_period,
            utility_images,
            gcs_configuration,
            gcs_credentials_secret,
            ssh_key_secrets,
            ssh_host_fingerprints,
            skip_cloning,
            cookiefile_secret,
        } = self;

        DecorationConfig {
            timeout: timeout.or(def.timeout),
            grace_period: grace_period.or(def.grace_period),
            utility_images: merge_nested(
                utility_images,
                &def.utility_images,
                UtilityImages::apply_default,
            ),
            gcs_configuration: merge_nested(
                gcs_configuration,
                &def.gcs_configuration,
                GcsConfiguration::apply_default,
            ),
            gcs_credentials_secret: merge_text(gcs_credentials_secret, &def.gcs_credentials_secret),
            ssh_key_secrets: merge_list(ssh_key_secrets, &def.ssh_key_secrets),
            ssh_host_fingerprints: merge_list(ssh_host_fingerprints, &def.ssh_host_fingerprints),
            skip_cloning: skip_cloning.or(def.skip_cloning),
            cookiefile_secret: merge_text(cookiefile_secret, &def.cookiefile_secret),
        }
    }

    /// Check that the config is complete enough to decorate a pod
    pub fn validate(&self) -> Result<(), DecorationError> {
        let images = self
            .utility_images
            .as_ref()
            .ok_or(DecorationError::MissingUtilityImages)?;
        let missing = images.missing();
        if !missing.is_empty() {
            return Err(DecorationError::MissingImages(missing));
        }

        let gcs = self
            .gcs_configuration
            .as_ref()
            .ok_or(DecorationError::MissingGcsConfiguration)?;
        if is_unset(&self.gcs_credentials_secret) {
            return Err(DecorationError::MissingGcsCredentials);
        }
        gcs.validate()
    }
}

impl UtilityImages {
    pub fn apply_default(&self, def: &UtilityImages) -> UtilityImages {
        let UtilityImages {
            clonerefs,
            initupload,
            entrypoint,
            sidecar,
        } = self;

        UtilityImages {
            clonerefs: merge_text(clonerefs, &def.clonerefs),
            initupload: merge_text(initupload, &def.initupload),
            entrypoint: merge_text(entrypoint, &def.entrypoint),
            sidecar: merge_text(sidecar, &def.sidecar),
        }
    }

    /// Names of the images that are not configured
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("clonerefs", &self.clonerefs),
            ("initupload", &self.initupload),
            ("entrypoint", &self.entrypoint),
            ("sidecar", &self.sidecar),
        ]
        .into_iter()
        .filter(|(_, image)| is_unset(image))
        .map(|(name, _)| name)
        .collect()
    }
}

impl GcsConfiguration {
    pub fn apply_default(&self, def: &GcsConfiguration) -> GcsConfiguration {
        let GcsConfiguration {
            bucket,
            path_prefix,
            path_strategy,
            default_org,
            default_repo,
        } = self;

        GcsConfiguration {
            bucket: merge_text(bucket, &def.bucket),
            path_prefix: merge_text(path_prefix, &def.path_prefix),
            path_strategy: merge_text(path_strategy, &def.path_strategy),
            default_org: merge_text(default_org, &def.default_org),
            default_repo: merge_text(default_repo, &def.default_repo),
        }
    }

    pub fn validate(&self) -> Result<(), DecorationError> {
        let strategy = self.path_strategy.as_deref().unwrap_or_default();
        match strategy {
            PATH_STRATEGY_LEGACY | PATH_STRATEGY_SINGLE | PATH_STRATEGY_EXPLICIT => {}
            other => return Err(DecorationError::InvalidPathStrategy(other.to_string())),
        }

        if strategy != PATH_STRATEGY_EXPLICIT
            && (is_unset(&self.default_org) || is_unset(&self.default_repo))
        {
            return Err(DecorationError::MissingDefaultOrgRepo(strategy.to_string()));
        }
        Ok(())
    }
}

fn is_unset(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

fn merge_text(own: &Option<String>, def: &Option<String>) -> Option<String> {
    if is_unset(own) { def.clone() } else { own.clone() }
}

fn merge_list(own: &[String], def: &[String]) -> Vec<String> {
    if own.is_empty() { def.to_vec() } else { own.to_vec() }
}

fn merge_nested<T: Clone>(
    own: &Option<T>,
    def: &Option<T>,
    merge: impl Fn(&T, &T) -> T,
) -> Option<T> {
    match (own, def) {
        (Some(own), Some(def)) => Some(merge(own, def)),
        (Some(own), None) => Some(own.clone()),
        (None, def) => def.clone(),
    }
}

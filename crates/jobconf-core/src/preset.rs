//! Label-selected pod spec injections
//!
//! A preset whose labels are all carried by a job contributes environment
//! variables, volumes and volume mounts to that job's pod spec.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, PresetError, Result};
use crate::pod::{EnvVar, PodSpec, Volume, VolumeMount};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
}

impl Preset {
    /// True if every label of the preset is present on the job with the same value
    pub fn matches(&self, job_labels: &BTreeMap<String, String>) -> bool {
        self.labels
            .iter()
            .all(|(key, value)| job_labels.get(key) == Some(value))
    }

    /// Inject the preset into `spec`
    ///
    /// Environment variables and mounts go into every container. A volume
    /// whose name already exists in the spec is left as it is, while a
    /// duplicate environment variable or mount name is an error.
    pub fn apply(&self, spec: &mut PodSpec) -> std::result::Result<(), PresetError> {
        for container in &mut spec.containers {
            for env in &self.env {
                if container.has_env(&env.name) {
                    return Err(PresetError::DuplicateEnv(env.name.clone()));
                }
                container.env.push(env.clone());
            }
            for mount in &self.volume_mounts {
                if container.has_volume_mount(&mount.name) {
                    return Err(PresetError::DuplicateVolumeMount(mount.name.clone()));
                }
                container.volume_mounts.push(mount.clone());
            }
        }

        for volume in &self.volumes {
            if spec.has_volume(&volume.name) {
                tracing::debug!(volume = %volume.name, "Volume already present, keeping job's own");
                continue;
            }
            spec.volumes.push(volume.clone());
        }
        Ok(())
    }
}

/// Apply every matching preset to a job's pod spec, in order
///
/// Jobs without a pod spec are left untouched.
pub fn resolve_presets(
    name: &str,
    labels: &BTreeMap<String, String>,
    spec: Option<&mut PodSpec>,
    presets: &[Preset],
) -> Result<()> {
    let Some(spec) = spec else {
        return Ok(());
    };

    for preset in presets.iter().filter(|p| p.matches(labels)) {
        preset.apply(spec).map_err(|source| Error::Preset {
            job: name.to_string(),
            source,
        })?;
    }
    Ok(())
}

/// Reject preset lists in which a `label:value` pair appears twice
pub fn check_unique_label_pairs(presets: &[Preset]) -> Result<()> {
    let mut seen = HashSet::new();
    for preset in presets {
        for (label, value) in &preset.labels {
            let pair = format!("{label}:{value}");
            if !seen.insert(pair.clone()) {
                return Err(Error::DuplicatePresetLabel { pair });
            }
        }
    }
    Ok(())
}

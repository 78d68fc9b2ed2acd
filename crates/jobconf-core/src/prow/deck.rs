//! Settings for the dashboard and its artifact viewers

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::duration::Duration;
use crate::error::{Error, Result};
use crate::jobs::RerunAuthConfig;
use crate::matcher::Matcher;

const DEFAULT_SIZE_LIMIT: i64 = 100_000_000;

/// Viewer names that were renamed when viewers became lenses
const RENAMED_VIEWERS: [(&str, &str); 3] = [
    ("build-log-viewer", "buildlog"),
    ("metadata-viewer", "metadata"),
    ("junit-viewer", "junit"),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    #[serde(default)]
    pub spyglass: Spyglass,

    /// How often the dashboard refreshes merge-queue status; defaults to 10s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tide_update_period: Option<Duration>,

    /// Orgs or repos not shown on the dashboard
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hidden_repos: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branding: Option<Branding>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub google_analytics: String,

    /// Who may re-run any job
    #[serde(default)]
    pub rerun_auth_config: RerunAuthConfig,
}

impl Deck {
    pub(crate) fn default_and_validate(&mut self) -> Result<()> {
        self.tide_update_period
            .get_or_insert(Duration::from_secs(10));

        self.spyglass
            .default_and_validate()
            .map_err(|message| Error::controller("deck", message))?;

        if self.rerun_auth_config.is_ambiguous() {
            return Err(Error::controller(
                "deck",
                "allow_anyone is set to true and authorized users or teams are specified",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branding {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub logo: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub favicon: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub background_color: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub header_color: String,
}

/// Artifact viewer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spyglass {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lenses: Vec<LensFileConfig>,

    /// Legacy file pattern to viewer names mapping, folded into `lenses` at load
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub viewers: BTreeMap<String, Vec<String>>,

    /// Largest artifact in bytes read whole; defaults to 100MB
    #[serde(default)]
    pub size_limit: i64,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub gcs_browser_prefix: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub announcement: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub testgrid_config: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub testgrid_root: String,

    #[serde(skip)]
    regex_cache: BTreeMap<String, Matcher>,
}

impl Spyglass {
    /// The compiled form of a lens file pattern
    pub fn file_matcher(&self, pattern: &str) -> Option<&Matcher> {
        self.regex_cache.get(pattern)
    }

    fn default_and_validate(&mut self) -> std::result::Result<(), String> {
        if self.size_limit == 0 {
            self.size_limit = DEFAULT_SIZE_LIMIT;
        } else if self.size_limit < 0 {
            return Err("invalid value for spyglass.size_limit, must be >= 0".to_string());
        }

        for names in self.viewers.values_mut() {
            for name in names.iter_mut() {
                if let Some((_, renamed)) = RENAMED_VIEWERS.iter().find(|(old, _)| old == name) {
                    *name = (*renamed).to_string();
                }
            }
        }

        let mut migrated: Vec<LensFileConfig> = self
            .viewers
            .iter()
            .flat_map(|(pattern, names)| {
                names.iter().map(move |name| LensFileConfig {
                    required_files: vec![pattern.clone()],
                    optional_files: Vec::new(),
                    lens: LensConfig {
                        name: name.clone(),
                        config: None,
                    },
                })
            })
            .collect();
        // Lenses are referenced by index, so the order must be stable.
        migrated.sort_by(|a, b| a.lens.name.cmp(&b.lens.name));
        self.lenses.extend(migrated);

        self.regex_cache.clear();
        for lens in &self.lenses {
            for pattern in lens.optional_files.iter().chain(&lens.required_files) {
                if self.regex_cache.contains_key(pattern) {
                    continue;
                }
                let matcher = Matcher::new(pattern)
                    .map_err(|e| format!("cannot compile regexp {pattern:?}: {e}"))?;
                self.regex_cache.insert(pattern.clone(), matcher);
            }
        }
        Ok(())
    }
}

/// A lens and the artifact files it reads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LensFileConfig {
    /// Patterns that must all match an artifact for the lens to show
    #[serde(default)]
    pub required_files: Vec<String>,

    /// Patterns for artifacts passed along when present
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional_files: Vec<String>,

    pub lens: LensConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LensConfig {
    pub name: String,

    /// Lens-specific settings, passed through uninterpreted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

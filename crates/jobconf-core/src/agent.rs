//! Shared access to the current configuration snapshot

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::{Config, load};
use crate::error::Result;

/// Holds the most recent successfully loaded [`Config`]
///
/// Readers get an `Arc` to an immutable snapshot. A reload builds a new
/// snapshot from scratch and only replaces the current one if it loads
/// cleanly, so a bad edit never takes away a working configuration.
#[derive(Debug)]
pub struct ConfigAgent {
    prow_config: PathBuf,
    job_config: Option<PathBuf>,
    current: RwLock<Arc<Config>>,
}

impl ConfigAgent {
    /// Load the configuration for the first time
    pub fn start(prow_config: impl Into<PathBuf>, job_config: Option<PathBuf>) -> Result<Self> {
        let prow_config = prow_config.into();
        let config = load(&prow_config, job_config.as_deref())?;
        Ok(Self {
            prow_config,
            job_config,
            current: RwLock::new(Arc::new(config)),
        })
    }

    /// The current snapshot
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Load again from the same paths, swapping in the result on success
    ///
    /// On failure the previous snapshot stays current and the error is returned.
    pub fn reload(&self) -> Result<Arc<Config>> {
        match load(&self.prow_config, self.job_config.as_deref()) {
            Ok(config) => {
                let config = Arc::new(config);
                *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&config);
                tracing::info!(path = %self.prow_config.display(), "Reloaded config");
                Ok(config)
            }
            Err(e) => {
                tracing::warn!(path = %self.prow_config.display(), error = %e, "Keeping previous config");
                Err(e)
            }
        }
    }

    pub fn prow_config_path(&self) -> &Path {
        &self.prow_config
    }

    pub fn job_config_path(&self) -> Option<&Path> {
        self.job_config.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobconf_test_utils::ConfigTree;

    #[test]
    fn test_reload_keeps_previous_on_failure() {
        let tree = ConfigTree::new();
        let path = tree.write("config.yaml", "pod_namespace: first\n");
        let agent = ConfigAgent::start(&path, None).unwrap();
        assert_eq!(agent.config().prow_config().pod_namespace, "first");

        tree.write("config.yaml", "log_level: nonsense\n");
        assert!(agent.reload().is_err());
        assert_eq!(agent.config().prow_config().pod_namespace, "first");

        tree.write("config.yaml", "pod_namespace: second\n");
        let reloaded = agent.reload().unwrap();
        assert_eq!(reloaded.prow_config().pod_namespace, "second");
        assert_eq!(agent.config().prow_config().pod_namespace, "second");
    }

    #[test]
    fn test_snapshots_outlive_reload() {
        let tree = ConfigTree::new();
        let path = tree.write("config.yaml", "pod_namespace: first\n");
        let agent = ConfigAgent::start(&path, None).unwrap();

        let held = agent.config();
        tree.write("config.yaml", "pod_namespace: second\n");
        agent.reload().unwrap();
        assert_eq!(held.prow_config().pod_namespace, "first");
    }
}

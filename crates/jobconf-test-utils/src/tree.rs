//! [`ConfigTree`] builder for configuration fixtures on disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

/// A temporary directory holding a primary config and job fragments.
///
/// # Example
///
/// ```rust,no_run
/// use jobconf_test_utils::ConfigTree;
///
/// let tree = ConfigTree::new();
/// tree.write("config.yaml", "pod_namespace: test-pods\n");
/// tree.write("jobs/org/repo/presubmits.yaml", "presubmits: {}\n");
/// assert!(tree.path("jobs").is_dir());
/// ```
pub struct ConfigTree {
    temp_dir: TempDir,
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigTree {
    /// Create an empty temporary directory.
    ///
    /// # Panics
    /// Panics if the temporary directory cannot be created.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new()
                .unwrap_or_else(|e| panic!("ConfigTree::new: failed to create temp dir: {e}")),
        }
    }

    /// Root of the tree.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `rel` inside the tree.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Absolute path of `rel` as a `String`, for APIs that take text paths.
    pub fn path_str(&self, rel: &str) -> String {
        self.path(rel).to_string_lossy().into_owned()
    }

    /// Write `content` to `rel`, creating parent directories.
    ///
    /// # Panics
    /// Panics if the filesystem operations fail.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        self.write_bytes(rel, content.as_bytes())
    }

    /// Write `content` gzip-compressed to `rel`.
    ///
    /// # Panics
    /// Panics if compression or the filesystem operations fail.
    pub fn write_gzip(&self, rel: &str, content: &str) -> PathBuf {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(content.as_bytes())
            .unwrap_or_else(|e| panic!("ConfigTree::write_gzip: failed to compress {rel}: {e}"));
        let compressed = encoder
            .finish()
            .unwrap_or_else(|e| panic!("ConfigTree::write_gzip: failed to finish {rel}: {e}"));
        self.write_bytes(rel, &compressed)
    }

    fn write_bytes(&self, rel: &str, content: &[u8]) -> PathBuf {
        let full_path = self.path(rel);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("ConfigTree: failed to create {}: {e}", parent.display())
            });
        }
        fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("ConfigTree: failed to write {}: {e}", full_path.display()));
        full_path
    }
}

//! Fragment enumeration
//!
//! The resolution engine never walks the filesystem itself. It consumes an
//! already-enumerated list of [`RawDocument`]s produced by a
//! [`FragmentSource`]. [`FsFragmentSource`] is the on-disk implementation:
//!
//! ```text
//! jobs/
//!   org-a/
//!     repo-presubmits.yaml
//!   org-b/
//!     repo-postsubmits.yml      <- may hold gzipped bytes, decompressed transparently
//!     repo-periodics.yml.gz     <- skipped (not a .yaml/.yml name)
//!   ..2019_10_01/               <- skipped (volume mount bookkeeping)
//! ```

use std::collections::HashSet;
use std::path::Path;

use walkdir::WalkDir;

use crate::{Error, Result, SourcePath, io};

/// A document's bytes, already decompressed, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub bytes: Vec<u8>,
    pub source: SourcePath,
}

impl RawDocument {
    pub fn new(bytes: Vec<u8>, source: impl Into<SourcePath>) -> Self {
        Self {
            bytes,
            source: source.into(),
        }
    }

    /// Read a single document from disk.
    pub fn read(path: &SourcePath) -> Result<Self> {
        Ok(Self {
            bytes: io::read_maybe_gzip(path)?,
            source: path.clone(),
        })
    }
}

/// Produces the job fragments found at a path.
pub trait FragmentSource {
    /// Enumerate every fragment at `path`, in a deterministic order.
    fn load_fragments(&self, path: &SourcePath) -> Result<Vec<RawDocument>>;
}

/// Reads fragments from the local filesystem.
///
/// `path` may name a single document or a directory tree. In a tree, only
/// `.yaml`/`.yml` files are fragments, entries whose name starts with `..`
/// are skipped, and every fragment must have a unique basename.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsFragmentSource;

impl FsFragmentSource {
    pub fn new() -> Self {
        Self
    }
}

impl FragmentSource for FsFragmentSource {
    fn load_fragments(&self, path: &SourcePath) -> Result<Vec<RawDocument>> {
        let native = path.to_native();
        let meta = std::fs::metadata(&native).map_err(|e| Error::io(&native, e))?;
        if !meta.is_dir() {
            return Ok(vec![RawDocument::read(path)?]);
        }

        let mut seen_basenames = HashSet::new();
        let mut documents = Vec::new();

        let walker = WalkDir::new(&native)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_mount_bookkeeping(entry.path()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(path = ?e.path(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            // Mounted config maps expose fragments as symlinks, so only directories are passed over.
            if entry.file_type().is_dir() {
                continue;
            }
            let source = SourcePath::new(entry.path());
            if !source.is_yaml() {
                continue;
            }

            let basename = source.basename().unwrap_or_default().to_string();
            if !seen_basenames.insert(basename.clone()) {
                return Err(Error::DuplicateBasename { basename });
            }

            tracing::debug!(%source, "Reading job fragment");
            documents.push(RawDocument::read(&source)?);
        }

        Ok(documents)
    }
}

/// Kubernetes volumes carry `..data`-style entries that are not fragments.
fn is_mount_bookkeeping(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with(".."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_bookkeeping_detection() {
        assert!(is_mount_bookkeeping(Path::new("/etc/jobs/..data")));
        assert!(is_mount_bookkeeping(Path::new("/etc/jobs/..2019_10_01")));
        assert!(!is_mount_bookkeeping(Path::new("/etc/jobs/.hidden.yaml")));
        assert!(!is_mount_bookkeeping(Path::new("/etc/jobs/jobs.yaml")));
    }

    #[test]
    fn test_raw_document_new_tags_source() {
        let doc = RawDocument::new(b"presets: []".to_vec(), "jobs/presets.yaml");
        assert_eq!(doc.source.as_str(), "jobs/presets.yaml");
        assert_eq!(doc.bytes, b"presets: []");
    }
}

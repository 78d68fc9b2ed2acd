//! Source locations for loaded documents

use std::path::{Path, PathBuf};

/// Location a document was read from, normalized to forward slashes.
///
/// Used for error messages and per-job provenance. Conversion back to a
/// platform path only happens at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SourcePath {
    inner: String,
}

impl SourcePath {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            inner: path.as_ref().to_string_lossy().replace('\\', "/"),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Final path component, ignoring trailing slashes.
    pub fn basename(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Extension of the basename, if any. Dotfiles have no extension.
    pub fn extension(&self) -> Option<&str> {
        let name = self.basename()?;
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx + 1..]),
        }
    }

    /// Whether this looks like a job fragment (`.yaml` or `.yml`).
    pub fn is_yaml(&self) -> bool {
        matches!(self.extension(), Some("yaml" | "yml"))
    }

    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }
}

impl AsRef<Path> for SourcePath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for SourcePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner)
    }
}

impl From<&str> for SourcePath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SourcePath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for SourcePath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for SourcePath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("jobs/org/repo/presubmits.yaml", Some("presubmits.yaml"), Some("yaml"))]
    #[case("jobs/periodics.yml", Some("periodics.yml"), Some("yml"))]
    #[case("config.yaml.gz", Some("config.yaml.gz"), Some("gz"))]
    #[case("jobs/.hidden", Some(".hidden"), None)]
    #[case("jobs/dir/", Some("dir"), None)]
    #[case("", None, None)]
    fn test_basename_and_extension(
        #[case] input: &str,
        #[case] basename: Option<&str>,
        #[case] extension: Option<&str>,
    ) {
        let path = SourcePath::new(input);
        assert_eq!(path.basename(), basename);
        assert_eq!(path.extension(), extension);
    }

    #[test]
    fn test_backslashes_are_normalized() {
        let path = SourcePath::new("jobs\\org\\presubmits.yaml");
        assert_eq!(path.as_str(), "jobs/org/presubmits.yaml");
        assert!(path.is_yaml());
    }
}

//! Reading documents from disk with transparent gzip decompression

use std::fs;
use std::io::Read;

use flate2::read::GzDecoder;

use crate::{Error, Result, SourcePath};

/// gzip member header, RFC 1952 section 2.3.1
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Returns true when `bytes` begins with the gzip magic number.
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Decompress `bytes` if they carry a gzip header, otherwise return them as-is.
pub fn decode_maybe_gzip(bytes: Vec<u8>, path: &SourcePath) -> Result<Vec<u8>> {
    if !is_gzip(&bytes) {
        return Ok(bytes);
    }
    let mut decoded = Vec::new();
    GzDecoder::new(bytes.as_slice())
        .read_to_end(&mut decoded)
        .map_err(|source| Error::Decompress {
            path: path.to_native(),
            source,
        })?;
    Ok(decoded)
}

/// Read a file, returning its decompressed contents if it is gzipped.
pub fn read_maybe_gzip(path: &SourcePath) -> Result<Vec<u8>> {
    let native = path.to_native();
    let bytes = fs::read(&native).map_err(|e| Error::io(&native, e))?;
    decode_maybe_gzip(bytes, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn gzip(content: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_plain_content_passes_through() {
        let path = SourcePath::new("config.yaml");
        let out = decode_maybe_gzip(b"plank: {}\n".to_vec(), &path).unwrap();
        assert_eq!(out, b"plank: {}\n");
    }

    #[test]
    fn test_gzip_content_is_decoded() {
        let path = SourcePath::new("config.yaml");
        let compressed = gzip(b"pod_namespace: test-pods\n");
        assert!(is_gzip(&compressed));
        let out = decode_maybe_gzip(compressed, &path).unwrap();
        assert_eq!(out, b"pod_namespace: test-pods\n");
    }

    #[test]
    fn test_truncated_gzip_is_an_error() {
        let path = SourcePath::new("broken.yaml");
        let mut compressed = gzip(b"periodics: []\n");
        compressed.truncate(6);
        let err = decode_maybe_gzip(compressed, &path).unwrap_err();
        assert!(matches!(err, Error::Decompress { .. }));
    }

    #[test]
    fn test_read_missing_file_reports_path() {
        let path = SourcePath::new("/nonexistent/jobconf/config.yaml");
        let err = read_maybe_gzip(&path).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/jobconf/config.yaml"));
    }
}

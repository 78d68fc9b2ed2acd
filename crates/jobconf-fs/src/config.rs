//! Format-agnostic document decoding

use serde::de::DeserializeOwned;

use crate::{Error, RawDocument, Result};

/// Decodes raw documents into typed configuration.
///
/// The format is picked from the source extension:
/// - `.toml` -> TOML
/// - `.json` -> JSON
/// - anything else -> YAML
///
/// A trailing `.gz` is ignored when picking the format, since the bytes have
/// already been decompressed by the time they get here.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigStore;

impl ConfigStore {
    pub fn new() -> Self {
        Self
    }

    /// Decode a document that has already been read (and decompressed).
    pub fn decode<T: DeserializeOwned>(&self, doc: &RawDocument) -> Result<T> {
        let parse_err = |format: &str, message: String| Error::ConfigParse {
            path: doc.source.to_native(),
            format: format.into(),
            message,
        };

        match format_extension(doc.source.as_str()).as_str() {
            "toml" => {
                let text = std::str::from_utf8(&doc.bytes)
                    .map_err(|e| parse_err("TOML", e.to_string()))?;
                toml::from_str(text).map_err(|e| parse_err("TOML", e.to_string()))
            }
            "json" => {
                serde_json::from_slice(&doc.bytes).map_err(|e| parse_err("JSON", e.to_string()))
            }
            _ => {
                // An empty YAML stream means "no settings", not a parse error.
                let bytes: &[u8] = if doc.bytes.iter().all(u8::is_ascii_whitespace) {
                    b"{}"
                } else {
                    &doc.bytes
                };
                serde_yaml::from_slice(bytes).map_err(|e| parse_err("YAML", e.to_string()))
            }
        }
    }
}

fn format_extension(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    let name = name.strip_suffix(".gz").unwrap_or(name);
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[idx + 1..].to_lowercase(),
        _ => String::new(),
    }
}

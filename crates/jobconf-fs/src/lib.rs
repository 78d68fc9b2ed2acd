//! Fragment retrieval for the job configuration engine
//!
//! Reads configuration documents from disk, transparently decompressing
//! gzipped content, enumerates job fragments in a directory tree, and
//! decodes documents into typed configuration by extension.

pub mod config;
pub mod error;
pub mod io;
pub mod path;
pub mod source;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use path::SourcePath;
pub use source::{FragmentSource, FsFragmentSource, RawDocument};

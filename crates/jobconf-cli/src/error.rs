//! Error types for jobconf-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The configuration failed to load
    #[error(transparent)]
    Core(#[from] jobconf_core::Error),

    /// Rendering the JSON summary failed
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The log subscriber could not be installed or updated
    #[error("logging setup failed: {message}")]
    Logging { message: String },
}

impl CliError {
    pub fn logging(message: impl ToString) -> Self {
        Self::Logging {
            message: message.to_string(),
        }
    }
}

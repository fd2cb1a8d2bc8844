//! Error types shared by the vetting crates

use thiserror::Error;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while building core values
#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed locale identifier
    #[error("Invalid locale id: {0}")]
    InvalidLocale(String),

    /// Organization name not in the fixed enumeration
    #[error("Unknown organization: {0}")]
    UnknownOrganization(String),

    /// Level name not recognized
    #[error("Unknown level: {0}")]
    UnknownLevel(String),

    /// Path that is not a well-formed element path
    #[error("Malformed path: {0}")]
    MalformedPath(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CoreError {
    /// Create a new invalid locale error
    pub fn invalid_locale<S: Into<String>>(msg: S) -> Self {
        CoreError::InvalidLocale(msg.into())
    }

    /// Create a new malformed path error
    pub fn malformed_path<S: Into<String>>(msg: S) -> Self {
        CoreError::MalformedPath(msg.into())
    }
}

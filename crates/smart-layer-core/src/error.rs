//! Error types for smart layer configuration
//!
//! Rule derivation itself cannot fail; these errors cover loading and parsing
//! the configuration that feeds it.

use thiserror::Error;

/// Main error type for configuration operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid configuration values
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// File access or I/O error
    #[error("File error: {0}")]
    FileError(String),

    /// Configuration parsing error
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Unknown configuration file format
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

impl CoreError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        CoreError::InvalidConfig(msg.into())
    }

    /// Error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::InvalidConfig(_) => "INVALID_CONFIG",
            CoreError::FileError(_) => "FILE_ERROR",
            CoreError::ParseError(_) => "PARSE_ERROR",
            CoreError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
        }
    }

    pub fn is_file_error(&self) -> bool {
        matches!(self, CoreError::FileError(_))
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::FileError(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::ParseError(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for CoreError {
    fn from(err: serde_yaml::Error) -> Self {
        CoreError::ParseError(format!("YAML error: {}", err))
    }
}

impl From<toml::de::Error> for CoreError {
    fn from(err: toml::de::Error) -> Self {
        CoreError::ParseError(format!("TOML error: {}", err))
    }
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, CoreError>;

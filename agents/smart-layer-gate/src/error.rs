//! Error types for the smart layer gate
//!
//! Covers everything outside a single request: loading configuration,
//! building the oracle client, running the demo host and the CLI.
//! Per-request failures never surface here; the gate turns them into 500s.

use smart_layer_core::CoreError;
use thiserror::Error;

use crate::client::OracleError;
use crate::telemetry::TelemetryError;

/// Main error type for gate operations
#[derive(Error, Debug)]
pub enum SmartLayerError {
    /// Invalid input data or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File access or I/O error
    #[error("File error: {0}")]
    FileError(String),

    #[error(transparent)]
    Config(#[from] CoreError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// Demo host failed to bind or serve
    #[error("Server error: {0}")]
    Server(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl SmartLayerError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        SmartLayerError::InvalidInput(msg.into())
    }

    pub fn file_error(msg: impl Into<String>) -> Self {
        SmartLayerError::FileError(msg.into())
    }

    /// Error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            SmartLayerError::InvalidInput(_) => "INVALID_INPUT",
            SmartLayerError::FileError(_) => "FILE_ERROR",
            SmartLayerError::Config(e) => e.error_code(),
            SmartLayerError::Oracle(e) => e.error_code(),
            SmartLayerError::Telemetry(_) => "TELEMETRY_ERROR",
            SmartLayerError::Server(_) => "SERVER_ERROR",
            SmartLayerError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a user-facing error (vs internal)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            SmartLayerError::InvalidInput(_)
                | SmartLayerError::FileError(_)
                | SmartLayerError::Config(_)
        )
    }

    pub fn is_file_error(&self) -> bool {
        match self {
            SmartLayerError::FileError(_) => true,
            SmartLayerError::Config(e) => e.is_file_error(),
            _ => false,
        }
    }
}

impl From<std::io::Error> for SmartLayerError {
    fn from(err: std::io::Error) -> Self {
        SmartLayerError::FileError(err.to_string())
    }
}

impl From<serde_json::Error> for SmartLayerError {
    fn from(err: serde_json::Error) -> Self {
        SmartLayerError::InvalidInput(format!("JSON error: {}", err))
    }
}

/// Result type alias for gate operations
pub type Result<T> = std::result::Result<T, SmartLayerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SmartLayerError::invalid_input("missing route");
        assert_eq!(err.to_string(), "Invalid input: missing route");

        let err = SmartLayerError::from(OracleError::Timeout(250));
        assert_eq!(err.to_string(), "Validation service timed out after 250ms");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(SmartLayerError::file_error("x").error_code(), "FILE_ERROR");
        assert_eq!(
            SmartLayerError::from(CoreError::invalid_config("x")).error_code(),
            "INVALID_CONFIG"
        );
        assert_eq!(
            SmartLayerError::from(OracleError::Timeout(1)).error_code(),
            "ORACLE_TIMEOUT"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(SmartLayerError::invalid_input("x").is_user_error());
        assert!(SmartLayerError::from(CoreError::FileError("gone".into())).is_file_error());
        assert!(!SmartLayerError::InternalError("x".into()).is_user_error());
        assert!(!SmartLayerError::Server("x".into()).is_file_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        assert!(SmartLayerError::from(io).is_file_error());
    }
}

//! CLI module for the smart layer
//!
//! Runs the demo host, prints the rules derived for configured routes and
//! checks individual payloads against the oracle.

pub mod commands;
pub mod output;

pub use commands::{SmartLayerCli, SmartLayerCommands};
pub use output::{CheckOutput, OutputFormat, RulesOutput};

use crate::error::SmartLayerError;
use crate::gate::GateOutcome;

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success; for `check`, the request would be forwarded
    Success = 0,
    /// The gate rejected the payload
    Rejected = 1,
    /// Invalid input, arguments or configuration values
    InvalidInput = 3,
    /// File not found or inaccessible
    FileError = 4,
    /// Oracle failure or internal error
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Exit code for a gate outcome
    pub fn from_outcome(outcome: &GateOutcome) -> Self {
        match outcome.status() {
            None => ExitCode::Success,
            Some(400) => ExitCode::Rejected,
            Some(_) => ExitCode::InternalError,
        }
    }

    /// Exit code for a failed command
    pub fn from_error(error: &SmartLayerError) -> Self {
        if error.is_file_error() {
            ExitCode::FileError
        } else if error.is_user_error() {
            ExitCode::InvalidInput
        } else {
            ExitCode::InternalError
        }
    }
}

/// Run the CLI with the given arguments and return the exit code
pub async fn run(cli: SmartLayerCli) -> Result<ExitCode, SmartLayerError> {
    match cli.command {
        SmartLayerCommands::Serve { config, host, port } => {
            commands::execute_serve(config, host, port).await
        }
        SmartLayerCommands::Rules {
            config,
            route,
            format,
        } => commands::execute_rules(config, route, format),
        SmartLayerCommands::Check {
            config,
            route,
            payload,
            format,
        } => commands::execute_check(config, route, payload, format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::OracleError;
    use crate::gate::{GateResponse, PassReason};
    use smart_layer_core::{CoreError, ValidationVerdict};

    #[test]
    fn test_exit_code_conversion() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::Rejected), 1);
        assert_eq!(i32::from(ExitCode::InvalidInput), 3);
        assert_eq!(i32::from(ExitCode::FileError), 4);
        assert_eq!(i32::from(ExitCode::InternalError), 10);
    }

    #[test]
    fn test_exit_code_from_outcome() {
        let next = GateOutcome::Next {
            reason: PassReason::NoPayload,
            validation: None,
        };
        assert_eq!(ExitCode::from_outcome(&next), ExitCode::Success);

        let rejected = GateOutcome::Respond(GateResponse::rejected(&ValidationVerdict::rejected(
            vec![],
            "bad",
        )));
        assert_eq!(ExitCode::from_outcome(&rejected), ExitCode::Rejected);

        let failed = GateOutcome::Respond(GateResponse::service_error("down"));
        assert_eq!(ExitCode::from_outcome(&failed), ExitCode::InternalError);
    }

    #[test]
    fn test_exit_code_from_error() {
        assert_eq!(
            ExitCode::from_error(&CoreError::FileError("gone".into()).into()),
            ExitCode::FileError
        );
        assert_eq!(
            ExitCode::from_error(&CoreError::invalid_config("bad").into()),
            ExitCode::InvalidInput
        );
        assert_eq!(
            ExitCode::from_error(&OracleError::Timeout(10).into()),
            ExitCode::InternalError
        );
    }
}

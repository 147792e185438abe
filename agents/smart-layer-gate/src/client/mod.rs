//! HTTP clients for external services
//!
//! The only outbound dependency of the gate is the validation oracle.

pub mod oracle;

pub use oracle::{
    OracleClient, OracleClientBuilder, OracleClientConfig, OracleError, OracleRequest,
    ValidationOracle,
};

//! Smart Layer Gate
//!
//! Request-validation gate for x402 payment-protected endpoints. Before a
//! paid request settles, its JSON payload is checked by a remote validation
//! oracle against natural-language rules derived from each endpoint's
//! expected fields. Malformed payloads are answered with a 400 and never
//! reach the paid handler.
//!
//! ## Architecture
//!
//! 1. **Gate** (`gate/`): the per-request decision, host independent.
//!
//! 2. **Client** (`client/`): HTTP client for the validation oracle, behind
//!    the [`ValidationOracle`] trait.
//!
//! 3. **Handler** (`handler/`): axum middleware adapter and the demo host.
//!
//! 4. **Telemetry** (`telemetry/`): Prometheus metrics and tracing setup.
//!
//! 5. **CLI** (`cli/`): `serve`, `rules` and `check` commands.
//!
//! Rule derivation, endpoint configuration and verdict types live in
//! `smart-layer-core`.
//!
//! ## CLI Usage
//!
//! ```bash
//! # Run the demo host
//! smart-layer serve --config smart-layer.yaml
//!
//! # Show what the oracle will be asked
//! smart-layer rules --config smart-layer.yaml --route /image/nano-banana
//!
//! # Run one payload through the gate
//! smart-layer check --config smart-layer.yaml --route /image/nano-banana --payload body.json
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use smart_layer_core::{EndpointSpec, GateConfig};
//! use smart_layer_gate::{
//!     client::OracleClient,
//!     handler::{smart_layer_middleware, GateState},
//!     Gate,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GateConfig::builder()
//!     .endpoint(
//!         "/image/nano-banana",
//!         EndpointSpec::new()
//!             .field("prompt", "must be a non-empty string describing the image")
//!             .field("aspect_ratio", "must be one of: 16:9, 9:16, 1:1"),
//!     )
//!     .build();
//!
//! let oracle = OracleClient::new("http://localhost:3000", 10_000)?;
//! let gate = Arc::new(Gate::new(config, Arc::new(oracle)));
//!
//! let app: axum::Router = axum::Router::new().layer(axum::middleware::from_fn_with_state(
//!     GateState::new(gate, 1024 * 1024),
//!     smart_layer_middleware,
//! ));
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod client;
pub mod error;
pub mod gate;
pub mod handler;
pub mod telemetry;

pub use cli::{ExitCode, SmartLayerCli, SmartLayerCommands};
pub use client::{OracleClient, OracleError, OracleRequest, ValidationOracle};
pub use error::{Result, SmartLayerError};
pub use gate::{Gate, GateError, GateOutcome, GateResponse, PassReason};
pub use handler::{smart_layer_middleware, GateState, SmartLayerValidation};
pub use telemetry::{init_tracing, GateMetrics, GateMetricsRegistry, LogOptions};

/// Agent version
pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");


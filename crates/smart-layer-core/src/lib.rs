//! Smart Layer Core
//!
//! Building blocks for the x402 smart validation layer: the pieces that decide
//! *what* to ask the validation oracle, without any I/O.
//!
//! ## Modules
//!
//! - [`rules`]: turns expectation descriptors into natural-language rules
//! - [`endpoint`]: per-route [`EndpointSpec`]s and the read-only [`GateConfig`]
//! - [`request`]: the framework-agnostic [`RequestView`] host adapters build
//! - [`verdict`]: the oracle's [`ValidationVerdict`]
//! - [`config`]: configuration file loading with environment overrides
//!
//! ## Example
//!
//! ```rust
//! use smart_layer_core::{EndpointSpec, GateConfig};
//!
//! let config = GateConfig::builder()
//!     .endpoint(
//!         "/image/nano-banana",
//!         EndpointSpec::new()
//!             .field("prompt", "must be a non-empty string describing the image")
//!             .field("style", "blue"),
//!     )
//!     .build();
//!
//! let rules = config.endpoint("/image/nano-banana").unwrap().rules();
//! assert_eq!(rules["style"], "must be a non-empty string (example: `blue`)");
//! ```

pub mod config;
pub mod endpoint;
pub mod error;
pub mod request;
pub mod rules;
pub mod verdict;

pub use config::{is_route_pattern, ConfigFormat, OracleSettings, ServerSettings, SmartLayerConfig};
pub use endpoint::{normalize_route, EndpointSpec, GateConfig, GateConfigBuilder};
pub use error::{CoreError, Result};
pub use request::RequestView;
pub use rules::{classify_text, derive, Expectation, RuleSet, TextKind};
pub use verdict::{parse_timestamp, FieldError, FieldWarning, OracleResponseBody, ValidationVerdict};

/// Request context key under which the verdict is attached
pub const VALIDATION_CONTEXT_KEY: &str = "smartLayerValidation";

//! Telemetry for the smart layer gate
//!
//! - `metrics` - Prometheus counters and histograms for gate decisions and
//!   oracle calls
//! - [`init_tracing`] - tracing subscriber setup for the binary

pub mod metrics;

pub use metrics::{GateMetrics, GateMetricsRegistry, OracleCallTimer};

use thiserror::Error;

/// Telemetry errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),

    #[error("Metrics encoding error: {0}")]
    Encoding(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Logging options for [`init_tracing`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Extra verbosity: 0 = info, 1 = debug, 2+ = trace
    pub verbosity: u8,
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level follows `verbosity`.
/// Calling this twice is harmless.
pub fn init_tracing(options: LogOptions) {
    let default_level = match options.verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = if options.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    // Already initialized
    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

//! Prometheus metrics for the smart layer gate
//!
//! - `smart_layer_gate_decisions_total` (counter) - gate outcomes by kind
//! - `smart_layer_oracle_duration_seconds` (histogram) - oracle call latency
//! - `smart_layer_oracle_failures_total` (counter) - oracle failures by kind
//! - `smart_layer_oracle_in_flight` (gauge) - oracle calls currently outstanding
//!
//! # Example
//!
//! ```rust,no_run
//! use smart_layer_gate::telemetry::GateMetricsRegistry;
//!
//! let registry = GateMetricsRegistry::new().unwrap();
//! registry.gate().record_decision("accepted");
//! println!("{}", registry.encode_text().unwrap());
//! ```

use prometheus::{CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry};
use std::sync::Arc;
use std::time::Instant;

use super::{Result, TelemetryError};

const NAMESPACE: &str = "smart_layer";

/// Gate metrics
pub struct GateMetrics {
    /// Gate outcomes (by outcome)
    decisions_total: CounterVec,

    /// Oracle call duration in seconds
    oracle_duration_seconds: Histogram,

    /// Oracle failures (by kind)
    oracle_failures_total: CounterVec,

    /// Oracle calls in progress
    oracle_in_flight: Gauge,
}

impl GateMetrics {
    /// Create the metrics and register them with the provided registry
    pub fn new(registry: &Registry) -> Result<Self> {
        let decisions_total = CounterVec::new(
            Opts::new("gate_decisions_total", "Total number of gate decisions by outcome")
                .namespace(NAMESPACE),
            &["outcome"],
        )?;

        let oracle_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "oracle_duration_seconds",
                "Validation oracle call duration in seconds",
            )
            .namespace(NAMESPACE)
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0]),
        )?;

        let oracle_failures_total = CounterVec::new(
            Opts::new("oracle_failures_total", "Total number of failed oracle calls by kind")
                .namespace(NAMESPACE),
            &["kind"],
        )?;

        let oracle_in_flight = Gauge::with_opts(
            Opts::new("oracle_in_flight", "Number of oracle calls currently in progress")
                .namespace(NAMESPACE),
        )?;

        registry.register(Box::new(decisions_total.clone()))?;
        registry.register(Box::new(oracle_duration_seconds.clone()))?;
        registry.register(Box::new(oracle_failures_total.clone()))?;
        registry.register(Box::new(oracle_in_flight.clone()))?;

        Ok(Self {
            decisions_total,
            oracle_duration_seconds,
            oracle_failures_total,
            oracle_in_flight,
        })
    }

    /// Record one gate decision
    pub fn record_decision(&self, outcome: &str) {
        self.decisions_total.with_label_values(&[outcome]).inc();
    }

    /// Number of decisions recorded for an outcome
    pub fn decision_count(&self, outcome: &str) -> u64 {
        self.decisions_total.with_label_values(&[outcome]).get() as u64
    }

    /// Record a failed oracle call
    pub fn record_oracle_failure(&self, kind: &str) {
        self.oracle_failures_total.with_label_values(&[kind]).inc();
    }

    /// Start timing an oracle call (records duration on drop)
    pub fn start_oracle_call(&self) -> OracleCallTimer<'_> {
        self.oracle_in_flight.inc();
        OracleCallTimer {
            start: Instant::now(),
            metrics: self,
        }
    }
}

/// RAII guard for timing oracle calls
pub struct OracleCallTimer<'a> {
    start: Instant,
    metrics: &'a GateMetrics,
}

impl<'a> OracleCallTimer<'a> {
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl<'a> Drop for OracleCallTimer<'a> {
    fn drop(&mut self) {
        self.metrics
            .oracle_duration_seconds
            .observe(self.start.elapsed().as_secs_f64());
        self.metrics.oracle_in_flight.dec();
    }
}

/// Registry for all gate metrics
pub struct GateMetricsRegistry {
    registry: Arc<Registry>,
    gate: Arc<GateMetrics>,
}

impl GateMetricsRegistry {
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Create with an existing Prometheus registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let gate = Arc::new(GateMetrics::new(&registry)?);
        Ok(Self { registry, gate })
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Shared handle to the gate metrics
    pub fn gate(&self) -> Arc<GateMetrics> {
        Arc::clone(&self.gate)
    }

    /// Encode metrics as text for scraping
    pub fn encode_text(&self) -> Result<String> {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(TelemetryError::MetricsError)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Encoding(e.to_string()))
    }
}

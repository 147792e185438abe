//! CLI command definitions for the smart layer
//!
//! Clap-based commands for running the demo host, printing derived rules and
//! checking a payload against the configured oracle.

use clap::{Parser, Subcommand};
use serde_json::Value;
use smart_layer_core::{normalize_route, RequestView, SmartLayerConfig};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::output::{CheckOutput, OutputFormat, RulesOutput};
use super::ExitCode;
use crate::client::{OracleClient, OracleClientConfig};
use crate::error::{Result, SmartLayerError};
use crate::gate::Gate;
use crate::handler::{create_router, AppState, GateState};
use crate::telemetry::GateMetricsRegistry;

/// x402 smart layer
///
/// Validate request payloads for paid endpoints before payment settles.
#[derive(Parser, Debug)]
#[command(name = "smart-layer")]
#[command(about = "x402 Smart Layer - request validation gate for paid endpoints", long_about = None)]
#[command(version)]
pub struct SmartLayerCli {
    /// Output verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: SmartLayerCommands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum SmartLayerCommands {
    /// Run the demo host with the gate in front of every configured route
    Serve {
        /// Path to the configuration file (YAML, JSON or TOML)
        #[arg(short, long, env = "SMART_LAYER_CONFIG")]
        config: PathBuf,

        /// Bind address, overrides `server.host`
        #[arg(long)]
        host: Option<String>,

        /// Listen port, overrides `server.port`
        #[arg(short, long, env = "SMART_LAYER_PORT")]
        port: Option<u16>,
    },

    /// Print the rules derived for configured routes
    Rules {
        /// Path to the configuration file (YAML, JSON or TOML)
        #[arg(short, long, env = "SMART_LAYER_CONFIG")]
        config: PathBuf,

        /// Only this route
        #[arg(short, long)]
        route: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Run a payload through the gate against the configured oracle
    ///
    /// Exits 0 when the request would be forwarded, 1 when rejected and 10
    /// when the oracle could not be used.
    Check {
        /// Path to the configuration file (YAML, JSON or TOML)
        #[arg(short, long, env = "SMART_LAYER_CONFIG")]
        config: PathBuf,

        /// Route the payload is sent to
        #[arg(short, long)]
        route: String,

        /// JSON file holding the request body
        #[arg(short = 'd', long)]
        payload: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Load the config file and apply environment overrides
pub fn load_config(path: &Path) -> Result<SmartLayerConfig> {
    let config = SmartLayerConfig::from_file(path)?.apply_env_overrides()?;
    tracing::debug!(
        path = %path.display(),
        endpoints = config.endpoints.len(),
        oracle = %config.oracle.base_url,
        "Configuration loaded"
    );
    Ok(config)
}

/// Build a gate talking to the configured oracle
pub fn build_gate(config: &SmartLayerConfig, metrics: Option<&GateMetricsRegistry>) -> Result<Gate> {
    let client = OracleClient::with_config(OracleClientConfig::from(&config.oracle))?;
    let gate = Gate::new(config.gate_config(), Arc::new(client));
    Ok(match metrics {
        Some(registry) => gate.with_metrics(registry.gate()),
        None => gate,
    })
}

/// Execute the serve command
pub async fn execute_serve(config: PathBuf, host: Option<String>, port: Option<u16>) -> Result<ExitCode> {
    let mut settings = load_config(&config)?;
    if let Some(host) = host {
        settings.server.host = host;
    }
    if let Some(port) = port {
        settings.server.port = port;
    }

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .map_err(|e| {
            SmartLayerError::invalid_input(format!(
                "Invalid listen address '{}:{}': {}",
                settings.server.host, settings.server.port, e
            ))
        })?;

    if settings.endpoints.is_empty() {
        tracing::warn!("No endpoints configured, every request will pass through");
    }

    let registry = Arc::new(GateMetricsRegistry::new()?);
    let gate = build_gate(&settings, Some(&registry))?;
    let state = AppState::new(
        GateState::new(Arc::new(gate), settings.server.max_body_size),
        registry,
        settings.oracle.base_url.clone(),
    );
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| SmartLayerError::Server(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(
        addr = %addr,
        endpoints = settings.endpoints.len(),
        oracle = %settings.oracle.base_url,
        payment_header = ?settings.payment_header,
        "Smart layer listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| SmartLayerError::Server(e.to_string()))?;

    tracing::info!("Smart layer stopped");
    Ok(ExitCode::Success)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Execute the rules command
pub fn execute_rules(config: PathBuf, route: Option<String>, format: OutputFormat) -> Result<ExitCode> {
    let settings = load_config(&config)?;
    let gate_config = settings.gate_config();

    let mut output = RulesOutput::default();
    match route {
        Some(route) => {
            let route = normalize_route(&route);
            let spec = gate_config.endpoint(&route).ok_or_else(|| {
                SmartLayerError::invalid_input(format!("Route '{}' is not configured", route))
            })?;
            output.routes.insert(route, spec.rules());
        }
        None => {
            for (route, spec) in gate_config.endpoints() {
                output.routes.insert(route.to_string(), spec.rules());
            }
        }
    }

    output.render(format)?;
    Ok(ExitCode::Success)
}

/// Execute the check command
pub async fn execute_check(
    config: PathBuf,
    route: String,
    payload: PathBuf,
    format: OutputFormat,
) -> Result<ExitCode> {
    let settings = load_config(&config)?;

    let content = std::fs::read_to_string(&payload).map_err(|e| {
        SmartLayerError::file_error(format!(
            "Failed to read payload file '{}': {}",
            payload.display(),
            e
        ))
    })?;
    let body: Value = serde_json::from_str(&content).map_err(|e| {
        SmartLayerError::invalid_input(format!("Payload '{}' is not JSON: {}", payload.display(), e))
    })?;

    let gate = build_gate(&settings, None)?;
    let request = RequestView::new("POST", route.as_str())
        .with_path(route.as_str())
        .with_body(body);

    let outcome = gate.evaluate(&request).await;
    CheckOutput::from_outcome(request.route(), &outcome).render(format)?;

    Ok(ExitCode::from_outcome(&outcome))
}

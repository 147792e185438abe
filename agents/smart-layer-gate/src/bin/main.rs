//! x402 Smart Layer CLI
//!
//! # Usage
//!
//! ```bash
//! # Run the demo host
//! smart-layer serve --config smart-layer.yaml --port 4021
//!
//! # Print derived rules
//! smart-layer rules --config smart-layer.yaml --format json
//!
//! # Check a payload against the oracle
//! smart-layer check --config smart-layer.yaml --route /image/nano-banana --payload body.json
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success, or the payload would be forwarded
//! - 1: Payload rejected by the gate
//! - 3: Invalid input, arguments or configuration
//! - 4: File not found or inaccessible
//! - 10: Oracle or internal error

use anyhow::Context;
use clap::Parser;
use smart_layer_gate::{cli, init_tracing, ExitCode, LogOptions, SmartLayerCli, SmartLayerError};

#[tokio::main]
async fn main() {
    let cli = SmartLayerCli::parse();

    init_tracing(LogOptions {
        json: cli.json_logs,
        verbosity: cli.verbose,
    });

    let exit_code = match cli::run(cli).await.context("smart-layer command failed") {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            e.downcast_ref::<SmartLayerError>()
                .map(ExitCode::from_error)
                .unwrap_or(ExitCode::InternalError)
        }
    };

    std::process::exit(exit_code.into());
}

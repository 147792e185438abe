//! Output formatting for the smart layer CLI
//!
//! JSON for machines, colored text for people.

use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smart_layer_core::{RuleSet, ValidationVerdict};
use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::error::{Result, SmartLayerError};
use crate::gate::GateOutcome;

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors
    #[default]
    Text,
    /// JSON for machine processing
    Json,
}

/// Derived rule sets, keyed by route
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesOutput {
    pub routes: BTreeMap<String, RuleSet>,
}

impl RulesOutput {
    pub fn render(&self, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Json => print_json(&self.routes),
            OutputFormat::Text => {
                let mut stdout = io::stdout();
                for (route, rules) in &self.routes {
                    writeln!(stdout, "{}", route.cyan().bold()).ok();
                    if rules.is_empty() {
                        writeln!(stdout, "  {}", "(no expected fields)".dimmed()).ok();
                    }
                    for (field, rule) in rules {
                        writeln!(stdout, "  {} {}", format!("{}:", field).bold(), rule).ok();
                    }
                    writeln!(stdout).ok();
                }
                stdout.flush().ok();
                Ok(())
            }
        }
    }
}

/// Result of running one payload through the gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutput {
    pub route: String,
    /// `next` or `respond`
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationVerdict>,
}

impl CheckOutput {
    pub fn from_outcome(route: impl Into<String>, outcome: &GateOutcome) -> Self {
        let route = route.into();
        match outcome {
            GateOutcome::Next { reason, validation } => Self {
                route,
                outcome: "next".to_string(),
                reason: Some(reason.as_str().to_string()),
                status: None,
                body: None,
                validation: validation.clone(),
            },
            GateOutcome::Respond(response) => Self {
                route,
                outcome: "respond".to_string(),
                reason: None,
                status: Some(response.status),
                body: Some(response.body.clone()),
                validation: None,
            },
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Json => print_json(self),
            OutputFormat::Text => {
                self.render_text();
                Ok(())
            }
        }
    }

    fn render_text(&self) {
        let mut stdout = io::stdout();

        match (&self.reason, self.status) {
            (Some(reason), _) => {
                writeln!(
                    stdout,
                    "{} {} passed through ({})",
                    "+".green(),
                    self.route,
                    reason.dimmed()
                )
                .ok();
                if let Some(verdict) = &self.validation {
                    writeln!(stdout, "  {} {}", "Summary:".dimmed(), verdict.summary).ok();
                    for warning in &verdict.warnings {
                        writeln!(stdout, "  {} {}: {}", "!".yellow(), warning.field, warning.message).ok();
                    }
                }
            }
            (None, Some(400)) => {
                writeln!(stdout, "{} {} rejected (400)", "x".red(), self.route).ok();
                let validation = self.body.as_ref().map(|b| &b["validation"]);
                if let Some(Value::Array(errors)) = validation.map(|v| &v["errors"]) {
                    for error in errors {
                        writeln!(
                            stdout,
                            "  {} {}: {}",
                            "x".red(),
                            error["field"].as_str().unwrap_or("?"),
                            error["message"].as_str().unwrap_or("")
                        )
                        .ok();
                    }
                }
                if let Some(summary) = validation.and_then(|v| v["summary"].as_str()) {
                    writeln!(stdout, "  {} {}", "Summary:".dimmed(), summary).ok();
                }
            }
            (None, status) => {
                let message = self
                    .body
                    .as_ref()
                    .and_then(|b| b["message"].as_str())
                    .unwrap_or("");
                writeln!(
                    stdout,
                    "{} {} failed ({}): {}",
                    "x".red().bold(),
                    self.route,
                    status.unwrap_or(500),
                    message
                )
                .ok();
            }
        }

        stdout.flush().ok();
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| SmartLayerError::InternalError(format!("Serialization error: {}", e)))?;
    println!("{}", json);
    Ok(())
}

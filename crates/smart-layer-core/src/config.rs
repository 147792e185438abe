//! Smart layer configuration file
//!
//! A single file (YAML, JSON or TOML, picked by extension) describes the
//! protected endpoints, the oracle connection and the demo host:
//!
//! ```yaml
//! debug: false
//! payment_header: x-payment   # optional, enables the header-gated variant
//! oracle:
//!   base_url: http://localhost:3000
//!   timeout_ms: 10000
//! server:
//!   port: 4021
//! endpoints:
//!   /image/nano-banana:
//!     expected_fields:
//!       prompt: must be a non-empty string
//!       aspect_ratio: "must be one of: 16:9, 9:16, 1:1"
//! ```
//!
//! Environment variables override file values, see
//! [`SmartLayerConfig::apply_env_overrides`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;

use crate::endpoint::{normalize_route, EndpointSpec, GateConfig, DEFAULT_ORACLE_TIMEOUT_MS};
use crate::error::{CoreError, Result};

/// Oracle base URL override
pub const ENV_ORACLE_URL: &str = "SMART_LAYER_ORACLE_URL";
/// Oracle timeout override, in milliseconds
pub const ENV_ORACLE_TIMEOUT_MS: &str = "SMART_LAYER_ORACLE_TIMEOUT_MS";
/// Debug flag override
pub const ENV_DEBUG: &str = "SMART_LAYER_DEBUG";

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "json" => Ok(ConfigFormat::Json),
            "toml" => Ok(ConfigFormat::Toml),
            other => Err(CoreError::UnsupportedFormat(if other.is_empty() {
                path.display().to_string()
            } else {
                other.to_string()
            })),
        }
    }
}

/// Oracle connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_ORACLE_TIMEOUT_MS
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Demo host settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest request body the gate will buffer
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4021
}

fn default_max_body_size() -> usize {
    1024 * 1024 // 1MB
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_size: default_max_body_size(),
        }
    }
}

/// Whole configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SmartLayerConfig {
    #[serde(default)]
    pub debug: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_header: Option<String>,
    #[serde(default)]
    pub oracle: OracleSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub endpoints: BTreeMap<String, EndpointSpec>,
}

impl SmartLayerConfig {
    /// Load and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::FileError(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), ?format, "Loading smart layer config");
        Self::parse(&content, format)
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let config: SmartLayerConfig = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
            ConfigFormat::Toml => toml::from_str(content)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_ORACLE_URL) {
            self.oracle.base_url = url;
        }
        if let Some(timeout) = lookup(ENV_ORACLE_TIMEOUT_MS) {
            self.oracle.timeout_ms = timeout.parse().map_err(|_| {
                CoreError::invalid_config(format!("{} must be an integer, got '{}'", ENV_ORACLE_TIMEOUT_MS, timeout))
            })?;
        }
        if let Some(debug) = lookup(ENV_DEBUG) {
            self.debug = matches!(debug.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        self.validate()?;
        Ok(self)
    }

    /// Check values the gate relies on
    pub fn validate(&self) -> Result<()> {
        if self.oracle.timeout_ms == 0 {
            return Err(CoreError::invalid_config("oracle.timeout_ms must be positive"));
        }
        if !(self.oracle.base_url.starts_with("http://") || self.oracle.base_url.starts_with("https://")) {
            return Err(CoreError::invalid_config(format!(
                "oracle.base_url must be an http(s) URL, got '{}'",
                self.oracle.base_url
            )));
        }
        if let Some(route) = self.endpoints.keys().find(|route| !route.starts_with('/')) {
            return Err(CoreError::invalid_config(format!(
                "endpoint route '{}' must start with '/'",
                route
            )));
        }
        if let Some(route) = self.endpoints.keys().find(|route| is_route_pattern(route)) {
            return Err(CoreError::invalid_config(format!(
                "endpoint route '{}' must be a literal path, ':' and '*' are not allowed",
                route
            )));
        }
        let mut seen: HashMap<String, &str> = HashMap::new();
        for route in self.endpoints.keys() {
            if let Some(first) = seen.insert(normalize_route(route), route) {
                return Err(CoreError::invalid_config(format!(
                    "endpoint routes '{}' and '{}' are the same route",
                    first, route
                )));
            }
        }
        if matches!(self.payment_header.as_deref(), Some(h) if h.trim().is_empty()) {
            return Err(CoreError::invalid_config("payment_header must not be empty"));
        }
        Ok(())
    }

    /// Build the read-only gate configuration
    pub fn gate_config(&self) -> GateConfig {
        let mut builder = GateConfig::builder()
            .endpoints(self.endpoints.iter().map(|(route, spec)| (route, spec.clone())))
            .debug(self.debug)
            .oracle_timeout(Duration::from_millis(self.oracle.timeout_ms));
        if let Some(header) = &self.payment_header {
            builder = builder.payment_header(header.trim());
        }
        builder.build()
    }
}

/// Whether a route would be read as a path pattern by the host router
pub fn is_route_pattern(route: &str) -> bool {
    route.contains(':') || route.contains('*')
}

//! Route configuration
//!
//! [`GateConfig`] maps normalized route paths to [`EndpointSpec`]s. It is built
//! once at startup and only read afterwards, so a single instance can be shared
//! behind an `Arc` by every in-flight request.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::rules::{self, Expectation, RuleSet};

/// Default bound on a single oracle call
pub const DEFAULT_ORACLE_TIMEOUT_MS: u64 = 10_000;

/// Expected payload fields for one configured route
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointSpec {
    /// Field name to expectation descriptor
    #[serde(default, alias = "expectedFields")]
    pub expected_fields: BTreeMap<String, Expectation>,
}

impl EndpointSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an expected field
    pub fn field(mut self, name: impl Into<String>, expectation: impl Into<Expectation>) -> Self {
        self.expected_fields.insert(name.into(), expectation.into());
        self
    }

    /// Derive the rule set for this endpoint
    pub fn rules(&self) -> RuleSet {
        rules::derive(&self.expected_fields)
    }
}

/// Normalize a route path for lookup.
///
/// Strips a single trailing `/` unless the path is exactly `/`. An empty path
/// is treated as the root.
pub fn normalize_route(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    if path.len() > 1 {
        if let Some(trimmed) = path.strip_suffix('/') {
            return trimmed.to_string();
        }
    }
    path.to_string()
}

/// Process-wide gate configuration
#[derive(Debug, Clone)]
pub struct GateConfig {
    endpoints: BTreeMap<String, EndpointSpec>,
    debug: bool,
    oracle_timeout: Duration,
    payment_header: Option<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            endpoints: BTreeMap::new(),
            debug: false,
            oracle_timeout: Duration::from_millis(DEFAULT_ORACLE_TIMEOUT_MS),
            payment_header: None,
        }
    }
}

impl GateConfig {
    /// Create a config builder
    pub fn builder() -> GateConfigBuilder {
        GateConfigBuilder::new()
    }

    /// Look up the spec for an already-normalized route
    pub fn endpoint(&self, route: &str) -> Option<&EndpointSpec> {
        self.endpoints.get(route)
    }

    /// Iterate configured routes in path order
    pub fn endpoints(&self) -> impl Iterator<Item = (&str, &EndpointSpec)> {
        self.endpoints.iter().map(|(route, spec)| (route.as_str(), spec))
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn oracle_timeout(&self) -> Duration {
        self.oracle_timeout
    }

    /// Header that must be present before a payload is validated, if any
    pub fn payment_header(&self) -> Option<&str> {
        self.payment_header.as_deref()
    }
}

/// Builder for GateConfig
pub struct GateConfigBuilder {
    config: GateConfig,
}

impl GateConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: GateConfig::default(),
        }
    }

    /// Register an endpoint. The route is normalized before insertion.
    pub fn endpoint(mut self, route: &str, spec: EndpointSpec) -> Self {
        self.config.endpoints.insert(normalize_route(route), spec);
        self
    }

    /// Register several endpoints at once
    pub fn endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = (S, EndpointSpec)>,
        S: AsRef<str>,
    {
        for (route, spec) in endpoints {
            self.config
                .endpoints
                .insert(normalize_route(route.as_ref()), spec);
        }
        self
    }

    /// Enable verbose gate tracing
    pub fn debug(mut self, enabled: bool) -> Self {
        self.config.debug = enabled;
        self
    }

    /// Bound on a single oracle call
    pub fn oracle_timeout(mut self, timeout: Duration) -> Self {
        self.config.oracle_timeout = timeout;
        self
    }

    /// Only validate requests carrying this header (header-gated variant)
    pub fn payment_header(mut self, header: impl Into<String>) -> Self {
        self.config.payment_header = Some(header.into().to_ascii_lowercase());
        self
    }

    pub fn build(self) -> GateConfig {
        self.config
    }
}

impl Default for GateConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_route() {
        assert_eq!(normalize_route("/image/nano-banana/"), "/image/nano-banana");
        assert_eq!(normalize_route("/image/nano-banana"), "/image/nano-banana");
        assert_eq!(normalize_route("/"), "/");
        assert_eq!(normalize_route(""), "/");
        // Only a single slash is stripped
        assert_eq!(normalize_route("/a//"), "/a/");
    }

    #[test]
    fn test_builder_normalizes_routes() {
        let config = GateConfig::builder()
            .endpoint("/image/nano-banana/", EndpointSpec::new().field("prompt", "required"))
            .build();

        assert!(config.endpoint("/image/nano-banana").is_some());
        assert!(config.endpoint("/image/nano-banana/").is_none());
    }

    #[test]
    fn test_gate_config_defaults() {
        let config = GateConfig::default();
        assert!(config.is_empty());
        assert!(!config.debug());
        assert_eq!(config.oracle_timeout(), Duration::from_secs(10));
        assert!(config.payment_header().is_none());
    }

    #[test]
    fn test_payment_header_is_lowercased() {
        let config = GateConfig::builder().payment_header("X-PAYMENT").build();
        assert_eq!(config.payment_header(), Some("x-payment"));
    }

    #[test]
    fn test_endpoint_spec_rules() {
        let spec = EndpointSpec::new()
            .field("prompt", "must be a non-empty string")
            .field("style", "blue");
        let rules = spec.rules();
        assert_eq!(rules["prompt"], "must be a non-empty string");
        assert_eq!(rules["style"], "must be a non-empty string (example: `blue`)");
    }

    #[test]
    fn test_endpoint_spec_accepts_camel_case() {
        let spec: EndpointSpec =
            serde_json::from_str(r#"{"expectedFields": {"count": 3}}"#).unwrap();
        assert_eq!(spec.rules()["count"], "must be a number (example: `3`)");
    }
}

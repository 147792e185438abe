//! Validation oracle HTTP client
//!
//! Sends `{rules, payload}` to `POST {base_url}/x402-smart-layer` and turns the
//! answer into a [`ValidationVerdict`] or a typed [`OracleError`].
//!
//! # Design
//!
//! One request per call, no retries: the gate treats every failure the same
//! way (HTTP 500) and leaves retry policy to the host. The reqwest client
//! carries its own timeout; the gate adds an outer bound on top.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use smart_layer_core::{OracleResponseBody, OracleSettings, RuleSet, ValidationVerdict};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Path of the validation endpoint on the oracle
pub const VALIDATION_PATH: &str = "/x402-smart-layer";

/// Errors from a single oracle call
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Validation service timed out after {0}ms")]
    Timeout(u64),

    #[error("Validation service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed validation response: {0}")]
    Parse(String),

    #[error("Validation service reported failure: {0}")]
    Unsuccessful(String),

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl OracleError {
    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            OracleError::Network(_) => "network",
            OracleError::Timeout(_) => "timeout",
            OracleError::Status { .. } => "status",
            OracleError::Parse(_) => "parse",
            OracleError::Unsuccessful(_) => "unsuccessful",
            OracleError::Client(_) => "client",
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            OracleError::Timeout(_) => "ORACLE_TIMEOUT",
            OracleError::Status { .. } | OracleError::Unsuccessful(_) => "ORACLE_REJECTED_CALL",
            OracleError::Parse(_) => "ORACLE_BAD_RESPONSE",
            OracleError::Network(_) | OracleError::Client(_) => "ORACLE_UNREACHABLE",
        }
    }

    /// Best-effort message for the caller-facing error body
    pub fn message(&self) -> String {
        match self {
            OracleError::Status { message, .. } | OracleError::Unsuccessful(message)
                if !message.is_empty() =>
            {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

/// Body of an oracle validation call
#[derive(Debug, Clone, Serialize)]
pub struct OracleRequest {
    pub rules: RuleSet,
    pub payload: Map<String, Value>,
}

/// Anything that can judge a payload against a rule set
#[async_trait]
pub trait ValidationOracle: Send + Sync {
    async fn validate(&self, request: &OracleRequest) -> Result<ValidationVerdict, OracleError>;
}

/// Configuration for the oracle client
#[derive(Debug, Clone)]
pub struct OracleClientConfig {
    /// Base URL of the oracle service
    pub base_url: String,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,

    /// Idle connections kept per host
    pub pool_max_idle_per_host: usize,
}

impl Default for OracleClientConfig {
    fn default() -> Self {
        let settings = OracleSettings::default();
        Self {
            base_url: settings.base_url,
            timeout_ms: settings.timeout_ms,
            pool_max_idle_per_host: 10,
        }
    }
}

impl From<&OracleSettings> for OracleClientConfig {
    fn from(settings: &OracleSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            timeout_ms: settings.timeout_ms,
            ..Default::default()
        }
    }
}

/// HTTP client for the validation oracle
pub struct OracleClient {
    client: Client,
    config: OracleClientConfig,
}

impl OracleClient {
    /// Create a client with default pooling
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Result<Self, OracleError> {
        Self::with_config(OracleClientConfig {
            base_url: base_url.into(),
            timeout_ms,
            ..Default::default()
        })
    }

    /// Create a client with custom configuration
    pub fn with_config(config: OracleClientConfig) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| OracleError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Full URL of the validation endpoint
    pub fn validation_url(&self) -> String {
        format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            VALIDATION_PATH
        )
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn timeout_ms(&self) -> u64 {
        self.config.timeout_ms
    }

    async fn send(&self, request: &OracleRequest) -> Result<ValidationVerdict, OracleError> {
        let response = self
            .client
            .post(self.validation_url())
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let message = extract_error_message(&text);
            return Err(OracleError::Status {
                status: status.as_u16(),
                message: if message.is_empty() {
                    status.to_string()
                } else {
                    message
                },
            });
        }

        let body: OracleResponseBody = serde_json::from_str(&text)
            .map_err(|e| OracleError::Parse(e.to_string()))?;

        if let Some(message) = body.failure() {
            return Err(OracleError::Unsuccessful(message));
        }

        body.into_verdict()
            .map_err(|e| OracleError::Parse(e.to_string()))
    }

    fn transport_error(&self, error: reqwest::Error) -> OracleError {
        if error.is_timeout() {
            OracleError::Timeout(self.config.timeout_ms)
        } else {
            OracleError::Network(error.to_string())
        }
    }
}

#[async_trait]
impl ValidationOracle for OracleClient {
    async fn validate(&self, request: &OracleRequest) -> Result<ValidationVerdict, OracleError> {
        let start = Instant::now();
        let result = self.send(request).await;

        match &result {
            Ok(verdict) => tracing::debug!(
                url = %self.validation_url(),
                valid = verdict.valid,
                error_count = verdict.errors.len(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Validation oracle answered"
            ),
            Err(e) => tracing::warn!(
                url = %self.validation_url(),
                error = %e,
                kind = e.kind(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Validation oracle call failed"
            ),
        }

        result
    }
}

/// Pull a message out of an error body.
///
/// JSON bodies contribute their `error` or `message` string; anything else is
/// returned as trimmed raw text.
pub fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);
        if let Some(message) = field("error").or_else(|| field("message")) {
            return message;
        }
    }
    body.trim().to_string()
}

/// Builder for OracleClient
pub struct OracleClientBuilder {
    config: OracleClientConfig,
}

impl OracleClientBuilder {
    pub fn new() -> Self {
        Self {
            config: OracleClientConfig::default(),
        }
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout_ms(mut self, timeout: u64) -> Self {
        self.config.timeout_ms = timeout;
        self
    }

    /// Set the idle pool size per host
    pub fn pool_max_idle_per_host(mut self, size: usize) -> Self {
        self.config.pool_max_idle_per_host = size;
        self
    }

    pub fn build(self) -> Result<OracleClient, OracleError> {
        OracleClient::with_config(self.config)
    }
}

impl Default for OracleClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_request() -> OracleRequest {
        let mut rules = RuleSet::new();
        rules.insert("prompt".to_string(), "must be a non-empty string".to_string());
        let payload = json!({ "prompt": "A sunset" }).as_object().cloned().unwrap();
        OracleRequest { rules, payload }
    }

    #[test]
    fn test_client_builder() {
        let client = OracleClientBuilder::new()
            .base_url("http://oracle:9090/")
            .timeout_ms(8000)
            .pool_max_idle_per_host(2)
            .build()
            .unwrap();

        assert_eq!(client.base_url(), "http://oracle:9090/");
        assert_eq!(client.timeout_ms(), 8000);
        assert_eq!(client.validation_url(), "http://oracle:9090/x402-smart-layer");
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(extract_error_message(r#"{"error": "rate limited"}"#), "rate limited");
        assert_eq!(extract_error_message(r#"{"message": "overloaded"}"#), "overloaded");
        assert_eq!(
            extract_error_message(r#"{"error": "first", "message": "second"}"#),
            "first"
        );
        assert_eq!(extract_error_message("  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(extract_error_message(r#"{"detail": "x"}"#), r#"{"detail": "x"}"#);
        assert_eq!(extract_error_message(""), "");
    }

    #[test]
    fn test_error_message_and_kind() {
        let err = OracleError::Status {
            status: 503,
            message: "maintenance".to_string(),
        };
        assert_eq!(err.kind(), "status");
        assert_eq!(err.message(), "maintenance");
        assert_eq!(
            OracleError::Timeout(5000).message(),
            "Validation service timed out after 5000ms"
        );
    }

    #[tokio::test]
    async fn test_validate_sends_rules_and_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(VALIDATION_PATH))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "rules": { "prompt": "must be a non-empty string" },
                "payload": { "prompt": "A sunset" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "valid": true,
                "errors": [],
                "warnings": [],
                "summary": "ok",
                "validatedAt": "2025-06-01T12:00:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OracleClient::new(server.uri(), 2000).unwrap();
        let verdict = client.validate(&sample_request()).await.unwrap();
        assert!(verdict.valid);
        assert_eq!(verdict.summary, "ok");
    }

    #[tokio::test]
    async fn test_non_success_status_extracts_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(503).set_body_json(json!({ "error": "oracle is down" })),
            )
            .mount(&server)
            .await;

        let client = OracleClient::new(server.uri(), 2000).unwrap();
        let err = client.validate(&sample_request()).await.unwrap_err();
        assert!(matches!(err, OracleError::Status { status: 503, .. }));
        assert_eq!(err.message(), "oracle is down");
    }

    #[tokio::test]
    async fn test_plain_text_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let client = OracleClient::new(server.uri(), 2000).unwrap();
        let err = client.validate(&sample_request()).await.unwrap_err();
        assert_eq!(err.message(), "upstream exploded");
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let client = OracleClient::new(server.uri(), 2000).unwrap();
        let err = client.validate(&sample_request()).await.unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[tokio::test]
    async fn test_success_false_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "error": "model unavailable"
            })))
            .mount(&server)
            .await;

        let client = OracleClient::new(server.uri(), 2000).unwrap();
        let err = client.validate(&sample_request()).await.unwrap_err();
        assert_eq!(err.kind(), "unsuccessful");
        assert_eq!(err.message(), "model unavailable");
    }

    #[tokio::test]
    async fn test_success_without_valid_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "summary": "no verdict"
            })))
            .mount(&server)
            .await;

        let client = OracleClient::new(server.uri(), 2000).unwrap();
        let err = client.validate(&sample_request()).await.unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[tokio::test]
    async fn test_verdict_keeps_extra_finding_keys() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "valid": false,
                "errors": [{ "field": "prompt", "rule": "r", "message": "m", "severity": "high" }],
                "validatedAt": "2025-01-01T00:00:00"
            })))
            .mount(&server)
            .await;

        let client = OracleClient::new(server.uri(), 2000).unwrap();
        let verdict = client.validate(&sample_request()).await.unwrap();
        assert_eq!(verdict.errors[0].extra["severity"], "high");
        assert_eq!(verdict.issued_at.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn test_client_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "valid": true }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = OracleClient::new(server.uri(), 50).unwrap();
        let err = client.validate(&sample_request()).await.unwrap_err();
        assert!(matches!(err, OracleError::Timeout(50)));
    }
}

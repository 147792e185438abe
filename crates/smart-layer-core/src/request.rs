//! Framework-agnostic request view
//!
//! Host integrations adapt their native request type into a [`RequestView`]
//! before handing it to the gate. Only the parts the gate reads are kept.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::endpoint::normalize_route;

/// Minimal view of an incoming HTTP request
#[derive(Debug, Clone, Default)]
pub struct RequestView {
    /// Decoded request path as resolved by the host router, if any
    pub path: Option<String>,
    /// Raw request URL (path and query string)
    pub url: String,
    /// HTTP method
    pub method: String,
    /// Parsed JSON body, `None` when absent or not JSON
    pub body: Option<Value>,
    /// Request headers, names lowercased
    pub headers: HashMap<String, String>,
}

impl RequestView {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Header lookup, case-insensitive on the name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Route used for endpoint lookup.
    ///
    /// Prefers the host-provided path; falls back to the raw URL without its
    /// query string when the path is missing or just `/`.
    pub fn route(&self) -> String {
        let raw = match self.path.as_deref() {
            Some(path) if path != "/" && !path.is_empty() => path,
            _ => strip_query(&self.url),
        };
        normalize_route(raw)
    }

    /// The body as a JSON object when it counts as a payload.
    ///
    /// Absent, null, scalar, array and empty-object bodies are not payloads.
    pub fn payload(&self) -> Option<&Map<String, Value>> {
        match &self.body {
            Some(Value::Object(map)) if !map.is_empty() => Some(map),
            _ => None,
        }
    }
}

fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}

//! Oracle verdict types
//!
//! [`ValidationVerdict`] is the oracle's answer for one payload. The wire form
//! uses camelCase and `validatedAt`; the verdict keeps the same field names on
//! serialization so downstream handlers see exactly what the oracle sent.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A rule the payload failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub rule: String,
    pub message: String,
    /// Any other keys the oracle attached, passed through as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldError {
    pub fn new(field: impl Into<String>, rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
            message: message.into(),
            extra: Map::new(),
        }
    }
}

/// A non-fatal remark about a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldWarning {
    pub field: String,
    pub message: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of one oracle call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationVerdict {
    /// Whether the oracle accepted the payload
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<FieldError>,
    #[serde(default)]
    pub warnings: Vec<FieldWarning>,
    #[serde(default)]
    pub summary: String,
    /// When the oracle issued the verdict
    #[serde(
        rename = "validatedAt",
        default = "Utc::now",
        deserialize_with = "lenient_timestamp"
    )]
    pub issued_at: DateTime<Utc>,
}

impl ValidationVerdict {
    /// A passing verdict with no findings
    pub fn accepted(summary: impl Into<String>) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            summary: summary.into(),
            issued_at: Utc::now(),
        }
    }

    /// A failing verdict with the given errors
    pub fn rejected(errors: Vec<FieldError>, summary: impl Into<String>) -> Self {
        Self {
            valid: false,
            errors,
            warnings: Vec::new(),
            summary: summary.into(),
            issued_at: Utc::now(),
        }
    }

    pub fn with_warning(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.warnings.push(FieldWarning {
            field: field.into(),
            message: message.into(),
            extra: Map::new(),
        });
        self
    }
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339, an offset-less date-time (read as UTC) or a bare date.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

// Unreadable timestamps fall back to receipt time
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(parse_timestamp)
        .unwrap_or_else(Utc::now))
}

/// 2xx body returned by the oracle
///
/// The failure envelope is read first; the verdict fields are only decoded
/// once the oracle reports success.
#[derive(Debug, Clone, Deserialize)]
pub struct OracleResponseBody {
    /// `false` means the oracle could not evaluate the payload
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

fn default_success() -> bool {
    true
}

impl OracleResponseBody {
    /// The oracle's own explanation when it reports `success: false`
    pub fn failure(&self) -> Option<String> {
        if self.success {
            return None;
        }
        Some(
            self.error
                .clone()
                .or_else(|| self.message.clone())
                .unwrap_or_else(|| "validation service returned success=false".to_string()),
        )
    }

    /// Decode the verdict carried by a successful body
    pub fn into_verdict(self) -> Result<ValidationVerdict, serde_json::Error> {
        serde_json::from_value(Value::Object(self.fields))
    }
}

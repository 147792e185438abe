//! The request gate
//!
//! Decides, per request, whether a payload is forwarded to the next handler
//! or answered here. The decision is a single linear pass:
//!
//! 1. resolve the route; unconfigured routes pass through
//! 2. (header-gated variant only) require the payment header
//! 3. detect a payload; requests without one pass through
//! 4. derive rules from the endpoint's expectations
//! 5. ask the oracle, bounded by the configured timeout
//! 6. reject with 400 on `valid: false`, otherwise pass through with the verdict
//!
//! [`GateOutcome`] carries exactly one of "call next" or "send this
//! response", and [`Gate::handle`] consumes both continuations as `FnOnce`, so
//! a request can never be both forwarded and answered, nor left hanging.

use futures::FutureExt;
use serde_json::{json, Value};
use smart_layer_core::{GateConfig, RequestView, ValidationVerdict};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

use crate::client::{OracleError, OracleRequest, ValidationOracle};
use crate::telemetry::GateMetrics;

/// `error` field of a 400 rejection body
pub const REJECTION_ERROR: &str = "Request validation failed";

/// `error` field of a 500 body
pub const SERVICE_ERROR: &str = "Validation service error";

const INTERNAL_ERROR_MESSAGE: &str = "Internal error while validating request";

/// Why a request was forwarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReason {
    /// No endpoint spec for the route
    Unconfigured,
    /// Header-gated variant and the payment header is missing
    MissingPaymentHeader,
    /// Body absent, null, empty or not an object
    NoPayload,
    /// The oracle accepted the payload
    Validated,
}

impl PassReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassReason::Unconfigured => "unconfigured",
            PassReason::MissingPaymentHeader => "no_payment_header",
            PassReason::NoPayload => "no_payload",
            PassReason::Validated => "accepted",
        }
    }
}

/// Terminal response produced by the gate
#[derive(Debug, Clone, PartialEq)]
pub struct GateResponse {
    pub status: u16,
    pub body: Value,
}

impl GateResponse {
    /// 400 carrying the oracle's findings verbatim
    pub fn rejected(verdict: &ValidationVerdict) -> Self {
        Self {
            status: 400,
            body: json!({
                "success": false,
                "error": REJECTION_ERROR,
                "validation": {
                    "errors": verdict.errors,
                    "warnings": verdict.warnings,
                    "summary": verdict.summary,
                },
            }),
        }
    }

    /// 500 for oracle or internal failures
    pub fn service_error(message: impl Into<String>) -> Self {
        Self {
            status: 500,
            body: json!({
                "success": false,
                "error": SERVICE_ERROR,
                "message": message.into(),
            }),
        }
    }
}

/// Result of evaluating one request
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// Forward to the next handler, with the verdict when one was obtained
    Next {
        reason: PassReason,
        validation: Option<ValidationVerdict>,
    },
    /// Answer with this response; the next handler must not run
    Respond(GateResponse),
}

impl GateOutcome {
    pub fn is_next(&self) -> bool {
        matches!(self, GateOutcome::Next { .. })
    }

    /// Status of the terminal response, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            GateOutcome::Respond(response) => Some(response.status),
            GateOutcome::Next { .. } => None,
        }
    }

    pub fn validation(&self) -> Option<&ValidationVerdict> {
        match self {
            GateOutcome::Next { validation, .. } => validation.as_ref(),
            GateOutcome::Respond(_) => None,
        }
    }
}

/// Failures that end in a 500
#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GateError {
    pub fn error_code(&self) -> &'static str {
        match self {
            GateError::Oracle(e) => e.error_code(),
            GateError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message placed in the response body
    pub fn message(&self) -> String {
        match self {
            GateError::Oracle(e) => e.message(),
            GateError::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}

/// Validation gate in front of paid endpoints
pub struct Gate {
    config: Arc<GateConfig>,
    oracle: Arc<dyn ValidationOracle>,
    metrics: Option<Arc<GateMetrics>>,
}

impl Gate {
    pub fn new(config: GateConfig, oracle: Arc<dyn ValidationOracle>) -> Self {
        Self {
            config: Arc::new(config),
            oracle,
            metrics: None,
        }
    }

    /// Record decisions and oracle timings in these metrics
    pub fn with_metrics(mut self, metrics: Arc<GateMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Whether the request's route has an endpoint spec
    pub fn is_configured(&self, request: &RequestView) -> bool {
        self.config.endpoint(&request.route()).is_some()
    }

    /// Run the gate and invoke exactly one continuation.
    ///
    /// `next` receives the verdict when the oracle accepted the payload and
    /// `None` for plain pass-through; `respond` receives the terminal response.
    pub async fn handle<T, R, N, Fut>(&self, request: &RequestView, respond: R, next: N) -> T
    where
        R: FnOnce(GateResponse) -> T,
        N: FnOnce(Option<ValidationVerdict>) -> Fut,
        Fut: Future<Output = T>,
    {
        match self.evaluate(request).await {
            GateOutcome::Next { validation, .. } => next(validation).await,
            GateOutcome::Respond(response) => respond(response),
        }
    }

    /// Evaluate a request. Never panics and never fails: every fault becomes
    /// a 500 [`GateResponse`].
    pub async fn evaluate(&self, request: &RequestView) -> GateOutcome {
        let request_id = request.header("x-request-id").unwrap_or("unknown");
        let span = tracing::info_span!(
            "smart_layer_gate",
            request_id = %request_id,
            method = %request.method,
        );

        async {
            match AssertUnwindSafe(self.decide(request)).catch_unwind().await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(error)) => self.failure(error),
                Err(panic) => self.failure(GateError::Internal(panic_message(panic.as_ref()))),
            }
        }
        .instrument(span)
        .await
    }

    async fn decide(&self, request: &RequestView) -> Result<GateOutcome, GateError> {
        let debug = self.config.debug();
        let route = request.route();

        let Some(spec) = self.config.endpoint(&route) else {
            if debug {
                tracing::info!(
                    route = %route,
                    path = ?request.path,
                    url = %request.url,
                    "Route not configured, passing through"
                );
            }
            return Ok(self.pass(PassReason::Unconfigured, None));
        };

        if let Some(header) = self.config.payment_header() {
            if request.header(header).is_none() {
                if debug {
                    tracing::info!(route = %route, header = %header, "Payment header missing, passing through");
                }
                return Ok(self.pass(PassReason::MissingPaymentHeader, None));
            }
        }

        let Some(payload) = request.payload() else {
            if debug {
                tracing::info!(route = %route, body = ?request.body, "No payload to validate, passing through");
            }
            return Ok(self.pass(PassReason::NoPayload, None));
        };

        let oracle_request = OracleRequest {
            rules: spec.rules(),
            payload: payload.clone(),
        };

        if debug {
            tracing::info!(
                route = %route,
                request = %serde_json::to_string(&oracle_request).unwrap_or_default(),
                "Sending payload to validation oracle"
            );
        }

        let verdict = self.call_oracle(&oracle_request).await?;

        if debug {
            tracing::info!(
                route = %route,
                verdict = %serde_json::to_string(&verdict).unwrap_or_default(),
                "Validation oracle verdict"
            );
        }

        if verdict.valid {
            tracing::info!(
                route = %route,
                warning_count = verdict.warnings.len(),
                "Payload accepted"
            );
            Ok(self.pass(PassReason::Validated, Some(verdict)))
        } else {
            tracing::info!(
                route = %route,
                error_count = verdict.errors.len(),
                summary = %verdict.summary,
                "Payload rejected"
            );
            self.record("rejected");
            Ok(GateOutcome::Respond(GateResponse::rejected(&verdict)))
        }
    }

    async fn call_oracle(&self, request: &OracleRequest) -> Result<ValidationVerdict, OracleError> {
        let timeout = self.config.oracle_timeout();
        let _timer = self.metrics.as_ref().map(|m| m.start_oracle_call());

        match tokio::time::timeout(timeout, self.oracle.validate(request)).await {
            Ok(result) => result,
            Err(_) => Err(OracleError::Timeout(timeout.as_millis() as u64)),
        }
    }

    fn pass(&self, reason: PassReason, validation: Option<ValidationVerdict>) -> GateOutcome {
        self.record(reason.as_str());
        GateOutcome::Next { reason, validation }
    }

    fn failure(&self, error: GateError) -> GateOutcome {
        let outcome = match &error {
            GateError::Oracle(e) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_oracle_failure(e.kind());
                }
                "oracle_error"
            }
            GateError::Internal(_) => "internal_error",
        };

        tracing::error!(error = %error, code = error.error_code(), "Request validation could not complete");
        if self.config.debug() {
            tracing::error!(detail = ?error, "Gate failure detail");
        }

        self.record(outcome);
        GateOutcome::Respond(GateResponse::service_error(error.message()))
    }

    fn record(&self, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_decision(outcome);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic during request validation".to_string()
    }
}

//! Route definitions for the demo host
//!
//! - POST on every configured route - stub paid resource behind the gate
//! - GET /health - health check
//! - GET /metrics - Prometheus text exposition
//!
//! The gate middleware wraps the whole router, so unconfigured paths are
//! passed through exactly as they would be in a real host.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use smart_layer_core::is_route_pattern;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::{
    request_logging_middleware, smart_layer_middleware, GateState, HealthResponse, HealthStatus,
    SmartLayerValidation,
};
use crate::telemetry::GateMetricsRegistry;

const RESERVED_ROUTES: &[&str] = &["/health", "/metrics"];

/// State shared by the demo routes
#[derive(Clone)]
pub struct AppState {
    pub gate: GateState,
    pub metrics: Arc<GateMetricsRegistry>,
    /// Oracle base URL, reported by `/health`
    pub oracle_url: String,
    /// Start time for uptime calculation
    pub start_time: Instant,
}

impl AppState {
    pub fn new(gate: GateState, metrics: Arc<GateMetricsRegistry>, oracle_url: impl Into<String>) -> Self {
        Self {
            gate,
            metrics,
            oracle_url: oracle_url.into(),
            start_time: Instant::now(),
        }
    }
}

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics));

    for (route, _) in state.gate.gate.config().endpoints() {
        if RESERVED_ROUTES.contains(&route) {
            tracing::warn!(route = %route, "Configured route shadows a built-in route, skipping");
            continue;
        }
        if is_route_pattern(route) {
            tracing::warn!(route = %route, "Configured route is not a literal path, skipping");
            continue;
        }
        router = router.route(route, post(paid_resource));
        if route != "/" {
            router = router.route(&format!("{}/", route), post(paid_resource));
        }
    }

    let gate_state = state.gate.clone();
    router.with_state(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(request_logging_middleware))
            .layer(middleware::from_fn_with_state(gate_state, smart_layer_middleware)),
    )
}

/// POST on a configured route - stub paid resource
///
/// Echoes what the gate attached so callers can see the receipt.
pub async fn paid_resource(
    uri: Uri,
    validation: Option<Extension<SmartLayerValidation>>,
    body: Bytes,
) -> Json<Value> {
    let payload = serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null);
    let validation = validation.map(|Extension(SmartLayerValidation(verdict))| verdict);

    Json(json!({
        "success": true,
        "resource": uri.path(),
        "validated": validation.is_some(),
        "validation": validation,
        "payload": payload,
    }))
}

/// GET /health - Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let config = state.gate.gate.config();
    let configured_endpoints = config.endpoints().count();

    let status = if configured_endpoints > 0 {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    Json(HealthResponse {
        status,
        configured_endpoints,
        oracle_url: state.oracle_url.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: crate::AGENT_VERSION.to_string(),
    })
}

/// GET /metrics - Prometheus metrics
pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.encode_text() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

//! axum host adapter for the gate
//!
//! - `middleware`: [`smart_layer_middleware`] turns an axum request into a
//!   [`RequestView`](smart_layer_core::RequestView), runs the gate and either
//!   forwards the request or answers it; plus request-id logging
//! - `routes`: the demo host (stub paid resources, `/health`, `/metrics`)
//!
//! Forwarded requests that were validated carry a [`SmartLayerValidation`]
//! extension, the axum counterpart of the `smartLayerValidation` context key.

pub mod middleware;
pub mod routes;

pub use middleware::{request_logging_middleware, smart_layer_middleware, GateState};
pub use routes::{create_router, health_check, metrics, paid_resource, AppState};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use smart_layer_core::ValidationVerdict;

use crate::gate::GateResponse;

/// Verdict attached to a forwarded request
#[derive(Debug, Clone, PartialEq)]
pub struct SmartLayerValidation(pub ValidationVerdict);

impl IntoResponse for GateResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body)).into_response()
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    /// Number of routes the gate validates
    pub configured_endpoints: usize,
    pub oracle_url: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Serving, but no endpoint is configured so nothing is validated
    Degraded,
}

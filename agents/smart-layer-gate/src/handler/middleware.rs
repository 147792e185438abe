//! Middleware for request processing
//!
//! - [`smart_layer_middleware`]: the validation gate
//! - [`request_logging_middleware`]: request ids and timing logs

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{request::Parts, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use smart_layer_core::RequestView;
use std::sync::Arc;
use std::time::Instant;

use super::SmartLayerValidation;
use crate::gate::{Gate, GateResponse};

/// Header carrying the request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// State for [`smart_layer_middleware`]
#[derive(Clone)]
pub struct GateState {
    pub gate: Arc<Gate>,
    /// Largest request body buffered for validation
    pub max_body_size: usize,
}

impl GateState {
    pub fn new(gate: Arc<Gate>, max_body_size: usize) -> Self {
        Self {
            gate,
            max_body_size,
        }
    }
}

/// Validation gate middleware
///
/// Bodies are only buffered for configured routes. The buffered bytes are
/// handed back to the downstream handler unchanged.
pub async fn smart_layer_middleware(
    State(state): State<GateState>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let view = request_view(&parts);

    if !state.gate.is_configured(&view) {
        let request = Request::from_parts(parts, body);
        return state
            .gate
            .handle(&view, GateResponse::into_response, |_| next.run(request))
            .await;
    }

    let bytes = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(
                error = %e,
                path = %parts.uri.path(),
                limit = state.max_body_size,
                "Failed to buffer request body"
            );
            return GateResponse::service_error(format!("Failed to read request body: {}", e))
                .into_response();
        }
    };

    let view = match parse_body(&bytes) {
        Some(body) => view.with_body(body),
        None => view,
    };

    let mut request = Request::from_parts(parts, Body::from(bytes));
    state
        .gate
        .handle(&view, GateResponse::into_response, |validation| async move {
            if let Some(verdict) = validation {
                request.extensions_mut().insert(SmartLayerValidation(verdict));
            }
            next.run(request).await
        })
        .await
}

fn request_view(parts: &Parts) -> RequestView {
    let mut view = RequestView::new(parts.method.as_str(), parts.uri.to_string())
        .with_path(parts.uri.path());
    for (name, value) in parts.headers.iter() {
        if let Ok(value) = value.to_str() {
            view = view.with_header(name.as_str(), value);
        }
    }
    view
}

/// Empty or non-JSON bodies count as no body
fn parse_body(bytes: &Bytes) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }
    serde_json::from_slice(bytes).ok()
}

/// Request logging middleware
///
/// Assigns an `x-request-id` when the client sent none, echoes it on the
/// response and logs method, path, status and timing.
pub async fn request_logging_middleware(mut request: Request, next: Next) -> Response {
    let request_id = match request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        Some(id) => id.to_string(),
        None => {
            let id = uuid::Uuid::new_v4().to_string();
            if let Ok(value) = HeaderValue::from_str(&id) {
                request.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            id
        }
    };

    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        "Request started"
    );

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[test]
    fn test_request_view_from_parts() {
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/image/nano-banana/?seed=1")
            .header("X-Payment", "abc")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();

        let view = request_view(&parts);
        assert_eq!(view.method, "POST");
        assert_eq!(view.url, "/image/nano-banana/?seed=1");
        assert_eq!(view.path.as_deref(), Some("/image/nano-banana/"));
        assert_eq!(view.header("x-payment"), Some("abc"));
        assert_eq!(view.route(), "/image/nano-banana");
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(&Bytes::new()), None);
        assert_eq!(parse_body(&Bytes::from_static(b"not json")), None);
        assert_eq!(
            parse_body(&Bytes::from_static(br#"{"prompt":"x"}"#)),
            Some(serde_json::json!({ "prompt": "x" }))
        );
        assert_eq!(parse_body(&Bytes::from_static(b"null")), Some(Value::Null));
    }
}

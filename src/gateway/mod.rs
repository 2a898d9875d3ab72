//! HTTP gateway (Axum): classification, readiness, and knowledge-base introspection.
//!
//! This module is primarily used by the `verity` server binary.

#![allow(missing_docs)]

pub mod error;
pub mod handler;
pub mod rate_limit;
pub mod state;

#[cfg(test)]
mod handler_tests;

use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::{
    cache_info_handler, classify_handler, readiness_handler, root_handler, topics_handler,
};
pub use rate_limit::ClientRateLimiter;
pub use state::AppState;

use crate::cache::{VERITY_STATUS_HEADER, VERITY_STATUS_HEALTHY};

/// Builds the router. Serve it with connect info so the classify route can
/// key its rate limit on the peer address.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/classify", post(classify_handler))
        .route("/health", get(readiness_handler))
        .route("/cache-info", get(cache_info_handler))
        .route("/topics", get(topics_handler));

    Router::new()
        .route("/", get(root_handler))
        .route("/healthz", get(health_handler))
        .nest("/api/v1", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Liveness only; readiness lives at `/api/v1/health`.
#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        VERITY_STATUS_HEADER,
        HeaderValue::from_static(VERITY_STATUS_HEALTHY),
    );

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse { status: "ok" }),
    )
        .into_response()
}

use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::cache::{
    CacheInfo, VERITY_STATUS_HEADER, VERITY_STATUS_HEALTHY, VERITY_STATUS_NOT_READY,
};
use crate::gateway::error::GatewayError;
use crate::gateway::state::AppState;
use crate::hashing::preview;
use crate::index::TopicCount;
use crate::models::{ModelError, ModelManager};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifyRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct BannerResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub health: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub models_loaded: bool,
    pub kb_size: usize,
}

#[derive(Debug, Serialize)]
pub struct TopicsResponse {
    pub total_topics: usize,
    pub topics: Vec<TopicCount>,
}

#[instrument(
    skip(state, payload),
    fields(
        request_id = %Uuid::new_v4(),
        client = %addr.ip(),
        text = tracing::field::Empty,
        cache = tracing::field::Empty
    )
)]
pub async fn classify_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> Result<Response, GatewayError> {
    state.limiter.check(addr.ip())?;

    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected malformed classify body");
        GatewayError::InvalidRequest(rejection.body_text())
    })?;

    let span = tracing::Span::current();
    span.record("text", tracing::field::display(preview(&request.text)));
    info!(chars = request.text.chars().count(), "Classify request");

    let classified = state.dispatcher.classify(&request.text).await.map_err(|e| {
        let err = GatewayError::from(e);
        match err.status_code() {
            StatusCode::BAD_REQUEST => warn!(error = %err, "Input validation failed"),
            _ => error!(kind = err.kind(), error = %err, "Classification failed"),
        }
        err
    })?;
    span.record("cache", classified.cache.as_header_value());

    let mut headers = HeaderMap::new();
    headers.insert(
        VERITY_STATUS_HEADER,
        HeaderValue::from_static(classified.cache.as_header_value()),
    );

    Ok((
        StatusCode::OK,
        headers,
        Json(classified.result.as_ref().clone()),
    )
        .into_response())
}

/// Probes every accessor the pipeline uses and returns the snippet count.
pub fn readiness(models: &ModelManager) -> Result<usize, ModelError> {
    models.get_embed_model()?;
    models.get_nli()?;
    models.get_index()?;
    Ok(models.get_snippets()?.len())
}

#[instrument(skip(state))]
pub async fn readiness_handler(State(state): State<AppState>) -> Response {
    let (status_code, body) = match readiness(&state.models) {
        Ok(kb_size) => (
            StatusCode::OK,
            ReadinessResponse {
                status: VERITY_STATUS_HEALTHY,
                models_loaded: true,
                kb_size,
            },
        ),
        Err(e) => {
            warn!(error = %e, "Readiness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ReadinessResponse {
                    status: VERITY_STATUS_NOT_READY,
                    models_loaded: false,
                    kb_size: 0,
                },
            )
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(VERITY_STATUS_HEADER, HeaderValue::from_static(body.status));

    (status_code, headers, Json(body)).into_response()
}

#[instrument(skip(state))]
pub async fn cache_info_handler(State(state): State<AppState>) -> Json<CacheInfo> {
    Json(state.dispatcher.cache().info())
}

#[instrument(skip(state))]
pub async fn topics_handler(
    State(state): State<AppState>,
) -> Result<Json<TopicsResponse>, GatewayError> {
    let kb = state.models.get_snippets().map_err(|e| {
        warn!(error = %e, "Topics requested before models loaded");
        GatewayError::from(e)
    })?;
    let topics = kb.topics();

    Ok(Json(TopicsResponse {
        total_topics: topics.len(),
        topics,
    }))
}

pub async fn root_handler() -> Json<BannerResponse> {
    Json(BannerResponse {
        message: "Verity claim verification API",
        version: env!("CARGO_PKG_VERSION"),
        health: "/api/v1/health",
    })
}

use std::net::IpAddr;
use std::time::Duration;

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::cache::VERITY_STATUS_HEADER;
use crate::dispatch::DispatchError;
use crate::models::ModelError;
use crate::pipeline::PipelineError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("rate limit exceeded for {client}")]
    RateLimited {
        client: IpAddr,
        retry_after: Duration,
    },

    #[error("service not ready: {0}")]
    NotReady(#[from] ModelError),

    #[error("classification timed out after {}s", after.as_secs())]
    Timeout { after: Duration },

    #[error("classification failed during {stage}: {message}")]
    ClassificationFailed { stage: &'static str, message: String },

    #[error("internal error: {0}")]
    InternalError(String),
}

impl GatewayError {
    /// Machine-readable kind, also sent as the status header value.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::InvalidRequest(_) => "invalid_input",
            GatewayError::RateLimited { .. } => "rate_limited",
            GatewayError::NotReady(_) => "not_ready",
            GatewayError::Timeout { .. } => "timeout",
            GatewayError::ClassificationFailed { .. } => "classification_failed",
            GatewayError::InternalError(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::NotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::ClassificationFailed { .. } | GatewayError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn details(&self) -> serde_json::Value {
        match self {
            GatewayError::RateLimited { retry_after, .. } => {
                serde_json::json!({ "retry_after_secs": retry_after.as_secs().max(1) })
            }
            GatewayError::NotReady(ModelError::NotLoaded { component }) => {
                serde_json::json!({ "component": component })
            }
            GatewayError::Timeout { after } => {
                serde_json::json!({ "timeout_secs": after.as_secs() })
            }
            GatewayError::ClassificationFailed { stage, .. } => {
                serde_json::json!({ "stage": stage })
            }
            _ => serde_json::Value::Null,
        }
    }
}

impl From<DispatchError> for GatewayError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::InvalidInput { reason } => GatewayError::InvalidRequest(reason),
            DispatchError::Timeout { after } => GatewayError::Timeout { after },
            DispatchError::Pipeline(PipelineError::Models(e)) => GatewayError::NotReady(e),
            DispatchError::Pipeline(e) => GatewayError::ClassificationFailed {
                stage: e.stage().as_str(),
                message: e.to_string(),
            },
            e @ (DispatchError::WorkerFailed { .. } | DispatchError::PoolClosed) => {
                GatewayError::InternalError(e.to_string())
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub kind: &'static str,
    pub message: String,
    pub details: serde_json::Value,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.kind();

        let mut headers = HeaderMap::new();
        headers.insert(VERITY_STATUS_HEADER, HeaderValue::from_static(kind));
        if let GatewayError::RateLimited { retry_after, .. } = &self {
            headers.insert(
                axum::http::header::RETRY_AFTER,
                HeaderValue::from(retry_after.as_secs().max(1)),
            );
        }

        let body = Json(ErrorResponse {
            kind,
            message: self.to_string(),
            details: self.details(),
        });

        (status, headers, body).into_response()
    }
}

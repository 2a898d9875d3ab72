use reqwest::StatusCode;
use serde::Deserialize;

use verity::VERITY_STATUS_HEADER;
use verity::pipeline::ClassificationResult;

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub models_loaded: bool,
    pub kb_size: usize,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
    pub details: serde_json::Value,
}

/// Outcome of a classify call: the parsed body plus the status header.
#[derive(Debug)]
pub enum ClassifyOutcome {
    Ok {
        result: ClassificationResult,
        cache_status: String,
    },
    Err {
        status: StatusCode,
        body: ErrorBody,
    },
}

impl ClassifyOutcome {
    pub fn unwrap_ok(self) -> (ClassificationResult, String) {
        match self {
            ClassifyOutcome::Ok {
                result,
                cache_status,
            } => (result, cache_status),
            ClassifyOutcome::Err { status, body } => {
                panic!("expected success, got {}: {:?}", status, body)
            }
        }
    }

    pub fn unwrap_err(self) -> (StatusCode, ErrorBody) {
        match self {
            ClassifyOutcome::Err { status, body } => (status, body),
            ClassifyOutcome::Ok { result, .. } => panic!("expected error, got {:?}", result),
        }
    }
}

pub struct TestClient {
    base_url: String,
    client: reqwest::Client,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub async fn health(&self) -> reqwest::Result<HealthResponse> {
        self.client
            .get(format!("{}/healthz", self.base_url))
            .send()
            .await?
            .json()
            .await
    }

    pub async fn readiness(&self) -> reqwest::Result<(StatusCode, ReadinessResponse)> {
        let response = self
            .client
            .get(format!("{}/api/v1/health", self.base_url))
            .send()
            .await?;
        let status = response.status();
        Ok((status, response.json().await?))
    }

    pub async fn get_json(&self, path: &str) -> reqwest::Result<(StatusCode, serde_json::Value)> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;
        let status = response.status();
        Ok((status, response.json().await?))
    }

    pub async fn classify(&self, text: &str) -> reqwest::Result<ClassifyOutcome> {
        self.classify_body(serde_json::json!({ "text": text })).await
    }

    pub async fn classify_body(&self, body: serde_json::Value) -> reqwest::Result<ClassifyOutcome> {
        let response = self
            .client
            .post(format!("{}/api/v1/classify", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let cache_status = response
            .headers()
            .get(VERITY_STATUS_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if status.is_success() {
            Ok(ClassifyOutcome::Ok {
                result: response.json().await?,
                cache_status,
            })
        } else {
            Ok(ClassifyOutcome::Err {
                status,
                body: response.json().await?,
            })
        }
    }
}

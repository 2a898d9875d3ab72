//! Router tests for the gateway handlers, driven through `tower::ServiceExt::oneshot`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{Request, StatusCode},
    response::IntoResponse,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::cache::VERITY_STATUS_HEADER;
use crate::config::Config;
use crate::dispatch::DispatchError;
use crate::embedding::{NliClassifier, SentenceEmbedder, TextEncoder};
use crate::gateway::error::GatewayError;
use crate::gateway::{AppState, create_router};
use crate::index::{FlatIpIndex, KnowledgeBase, KnowledgeBaseEntry};
use crate::models::{ModelError, ModelManager};
use crate::pipeline::{PipelineError, PipelineStage};
use crate::retrieval::l2_normalize;

fn knowledge_base() -> Vec<KnowledgeBaseEntry> {
    vec![
        KnowledgeBaseEntry::new(
            "Albert Einstein was a German-born theoretical physicist, born on 14 March 1879 in Ulm.",
            "Albert_Einstein",
        ),
        KnowledgeBaseEntry::new(
            "Einstein developed the theory of relativity, one of the two pillars of modern physics.",
            "Albert_Einstein",
        ),
        KnowledgeBaseEntry::new(
            "Mount Everest is Earth's highest mountain above sea level, located in the Himalayas.",
            "Mount_Everest",
        ),
    ]
}

fn loaded_models() -> Arc<ModelManager> {
    let encoder = SentenceEmbedder::stub().unwrap();
    let entries = knowledge_base();
    let vectors: Vec<Vec<f32>> = entries
        .iter()
        .map(|e| {
            let mut v = encoder.encode(&e.snippet).unwrap();
            l2_normalize(&mut v).unwrap();
            v
        })
        .collect();
    let index = FlatIpIndex::from_vectors(encoder.dim(), &vectors).unwrap();

    Arc::new(
        ModelManager::from_parts(
            Arc::new(encoder),
            Arc::new(NliClassifier::stub().unwrap()),
            Arc::new(index),
            Arc::new(KnowledgeBase::new(entries)),
        )
        .unwrap(),
    )
}

fn app_with(config: &Config, models: Arc<ModelManager>) -> Router {
    create_router(AppState::from_config(config, models))
        .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))))
}

fn app() -> Router {
    app_with(&Config::default(), loaded_models())
}

fn unloaded_app() -> Router {
    let config = Config::default();
    app_with(&config, Arc::new(ModelManager::from_config(&config)))
}

fn classify_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/classify")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn status_header(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(VERITY_STATUS_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn test_root_banner() {
    let response = app().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["health"], "/api/v1/health");
}

#[tokio::test]
async fn test_liveness_does_not_need_models() {
    let response = unloaded_app().oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(status_header(&response), "healthy");
}

#[tokio::test]
async fn test_readiness_when_loaded() {
    let response = app().oneshot(get("/api/v1/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["models_loaded"], true);
    assert_eq!(json["kb_size"], 3);
}

#[tokio::test]
async fn test_readiness_when_not_loaded() {
    let response = unloaded_app().oneshot(get("/api/v1/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(status_header(&response), "not_ready");

    let json = body_json(response).await;
    assert_eq!(json["status"], "not_ready");
    assert_eq!(json["models_loaded"], false);
    assert_eq!(json["kb_size"], 0);
}

#[tokio::test]
async fn test_classify_truth() {
    let response = app()
        .oneshot(classify_request(
            serde_json::json!({"text": "Albert Einstein was born in 1879."}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(status_header(&response), "MISS");

    let json = body_json(response).await;
    assert_eq!(json["overall_classification"], "truth");
    assert!(json["confidence"].as_f64().unwrap() >= 0.70);

    let claim = &json["claims"][0];
    assert_eq!(claim["classification"], "truth");
    assert_eq!(claim["best_evidence"]["source"], "Albert_Einstein");
    assert!(claim["best_evidence"]["snippet"].is_string());
    assert!(claim["best_evidence"]["nli_score"].as_f64().unwrap() >= 0.70);
}

#[tokio::test]
async fn test_classify_falsehood() {
    let response = app()
        .oneshot(classify_request(
            serde_json::json!({"text": "Albert Einstein was born in 1990."}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["overall_classification"], "falsehood");
}

#[tokio::test]
async fn test_second_classify_is_cache_hit() {
    let router = app();
    let body = serde_json::json!({"text": "Mount Everest is the highest mountain."});

    let first = router
        .clone()
        .oneshot(classify_request(body.clone()))
        .await
        .unwrap();
    assert_eq!(status_header(&first), "MISS");
    let first_bytes = first.into_body().collect().await.unwrap().to_bytes();

    let second = router.oneshot(classify_request(body)).await.unwrap();
    assert_eq!(status_header(&second), "HIT");
    let second_bytes = second.into_body().collect().await.unwrap().to_bytes();

    assert_eq!(first_bytes, second_bytes);
}

#[tokio::test]
async fn test_classify_whitespace_only_is_bad_request() {
    let response = app()
        .oneshot(classify_request(serde_json::json!({"text": "   \n\t "})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(status_header(&response), "invalid_input");

    let json = body_json(response).await;
    assert_eq!(json["kind"], "invalid_input");
    assert!(json["message"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_classify_malformed_body_is_bad_request() {
    let response = app()
        .oneshot(classify_request(serde_json::json!({"content": "no text field"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["kind"], "invalid_input");
}

#[tokio::test]
async fn test_classify_oversized_input_is_bad_request() {
    let config = Config {
        max_input_chars: 20,
        ..Default::default()
    };
    let response = app_with(&config, loaded_models())
        .oneshot(classify_request(
            serde_json::json!({"text": "Albert Einstein was born in 1879 in Ulm."}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_classify_not_ready_is_503() {
    let response = unloaded_app()
        .oneshot(classify_request(
            serde_json::json!({"text": "Albert Einstein was born in 1879."}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["kind"], "not_ready");
}

#[tokio::test]
async fn test_classify_rate_limited_after_quota() {
    let config = Config {
        rate_limit_per_minute: 2,
        ..Default::default()
    };
    let router = app_with(&config, loaded_models());
    let body = serde_json::json!({"text": "The Moon orbits the Earth."});

    for _ in 0..2 {
        let response = router
            .clone()
            .oneshot(classify_request(body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router.oneshot(classify_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));

    let json = body_json(response).await;
    assert_eq!(json["kind"], "rate_limited");
    assert!(json["details"]["retry_after_secs"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn test_rate_limit_rejects_before_validation() {
    let config = Config {
        rate_limit_per_minute: 1,
        ..Default::default()
    };
    let router = app_with(&config, loaded_models());

    let first = router
        .clone()
        .oneshot(classify_request(serde_json::json!({"text": ""})))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::BAD_REQUEST);

    let second = router
        .oneshot(classify_request(serde_json::json!({"text": ""})))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_topics_lists_sources() {
    let response = app().oneshot(get("/api/v1/topics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["total_topics"], 2);
    assert_eq!(json["topics"][0]["source"], "Albert_Einstein");
    assert_eq!(json["topics"][0]["snippets"], 2);
    assert_eq!(json["topics"][1]["source"], "Mount_Everest");
}

#[tokio::test]
async fn test_topics_not_ready() {
    let response = unloaded_app().oneshot(get("/api/v1/topics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_cache_info_tracks_hits_and_misses() {
    let router = app();
    let body = serde_json::json!({"text": "Albert Einstein was born in 1879."});

    for _ in 0..2 {
        router
            .clone()
            .oneshot(classify_request(body.clone()))
            .await
            .unwrap();
    }

    let response = router.oneshot(get("/api/v1/cache-info")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["ttl_secs"], 300);
    assert_eq!(json["normalization"], "whitespace");
}

#[tokio::test]
async fn test_cors_preflight_allowed() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/v1/classify")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[test]
fn test_dispatch_error_mapping() {
    let cases = [
        (
            GatewayError::from(DispatchError::InvalidInput {
                reason: "empty".into(),
            }),
            StatusCode::BAD_REQUEST,
            "invalid_input",
        ),
        (
            GatewayError::from(DispatchError::Timeout {
                after: std::time::Duration::from_secs(45),
            }),
            StatusCode::GATEWAY_TIMEOUT,
            "timeout",
        ),
        (
            GatewayError::from(DispatchError::Pipeline(PipelineError::Models(
                ModelError::NotLoaded { component: "nli" },
            ))),
            StatusCode::SERVICE_UNAVAILABLE,
            "not_ready",
        ),
        (
            GatewayError::from(DispatchError::Pipeline(PipelineError::Cancelled {
                stage: PipelineStage::EvidenceGathered,
            })),
            StatusCode::INTERNAL_SERVER_ERROR,
            "classification_failed",
        ),
        (
            GatewayError::from(DispatchError::PoolClosed),
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
        ),
    ];

    for (err, status, kind) in cases {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.kind(), kind);
    }
}

#[tokio::test]
async fn test_timeout_error_body() {
    let response = GatewayError::Timeout {
        after: std::time::Duration::from_secs(45),
    }
    .into_response();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(status_header(&response), "timeout");

    let json = body_json(response).await;
    assert_eq!(json["kind"], "timeout");
    assert_eq!(json["details"]["timeout_secs"], 45);
    assert!(json["message"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_classification_failure_details_carry_stage() {
    let err = GatewayError::from(DispatchError::Pipeline(PipelineError::Cancelled {
        stage: PipelineStage::Scored,
    }));
    let json = body_json(err.into_response()).await;

    assert_eq!(json["details"]["stage"], "scored");
}

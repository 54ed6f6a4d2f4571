//! Router tests driven through `tower::ServiceExt::oneshot`.
#![cfg(feature = "server")]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::util::ServiceExt;

use tron_gateway::server::{AppState, router};
use tron_gateway::{
    Engine, GatewayError, InvokeOptions, MetricsAggregator, ModelClient, ModelResponse, Result,
};

// ============================================================================
// Fixtures
// ============================================================================

struct CannedClient;

#[async_trait]
impl ModelClient for CannedClient {
    fn name(&self) -> &str {
        "canned"
    }

    async fn invoke(&self, _model: &str, prompt: &str, _options: &InvokeOptions) -> Result<ModelResponse> {
        if prompt.contains("explode") {
            return Err(GatewayError::Api {
                status: 500,
                message: "Gemini API error: boom".into(),
            });
        }
        Ok(ModelResponse::text("canned reply"))
    }
}

struct Harness {
    app: Router,
    metrics: Arc<MetricsAggregator>,
    _files: TempDir,
}

fn harness() -> Harness {
    let files = tempfile::tempdir().unwrap();
    let metrics = Arc::new(MetricsAggregator::new());
    let engine = Engine::builder()
        .client(Arc::new(CannedClient))
        .metrics(metrics.clone())
        .files_dir(files.path())
        .build()
        .unwrap();
    Harness {
        app: router(AppState::new(Arc::new(engine))),
        metrics,
        _files: files,
    }
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// ============================================================================
// Platform endpoints
// ============================================================================

#[tokio::test]
async fn root_reports_platform() {
    let h = harness();
    let (status, body) = get(&h.app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "operational");
    assert_eq!(body["capabilities"], 9);
    assert!(body["models"].as_array().unwrap().len() >= 1);
}

#[tokio::test]
async fn health_flags_missing_secrets() {
    let files = tempfile::tempdir().unwrap();
    let engine = Engine::builder()
        .client(Arc::new(CannedClient))
        .files_dir(files.path())
        .build()
        .unwrap();
    let app = router(AppState::new(Arc::new(engine)).with_missing_secrets(vec!["GEMINI_API_KEY"]));

    let (status, body) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "configuration_error");
    assert_eq!(body["environment"]["missing_variables"], json!(["GEMINI_API_KEY"]));

    let (_, healthy) = get(&harness().app, "/health").await;
    assert_eq!(healthy["status"], "healthy");
}

// ============================================================================
// Capabilities
// ============================================================================

#[tokio::test]
async fn generate_text_success_shape() {
    let h = harness();
    let (status, body) = post(
        &h.app,
        "/api/ultimate-ai/generate-text",
        json!({"prompt": "hello"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["response"], "canned reply");
    assert_eq!(body["capability"], "text_generation");
    assert!(body["processing_time"].as_f64().unwrap() >= 0.0);
    assert_eq!(h.metrics.snapshot().total_requests, 1);
}

#[tokio::test]
async fn model_failure_is_200_with_success_false() {
    let h = harness();
    let (status, body) = post(
        &h.app,
        "/api/ultimate-ai/execute-code",
        json!({"code": "explode()", "language": "rust"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "explode()");
    assert_eq!(body["language"], "rust");
    assert!(body["error"].as_str().unwrap().contains("boom"));
    assert_eq!(h.metrics.snapshot().error_count, 1);
}

#[tokio::test]
async fn missing_field_is_422_envelope() {
    let h = harness();
    let (status, body) = post(&h.app, "/api/ultimate-ai/research-web", json!({"context": "x"})).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], true);
    assert_eq!(body["status_code"], 422);
    assert_eq!(body["path"], "/api/ultimate-ai/research-web");
    // rejected requests never reach the aggregator
    assert_eq!(h.metrics.snapshot().total_requests, 0);
}

#[tokio::test]
async fn created_file_can_be_downloaded() {
    let h = harness();
    let (_, created) = post(
        &h.app,
        "/api/ultimate-ai/create-file",
        json!({"content": "a,b\n1,2\n", "filename": "table", "format": "csv"}),
    )
    .await;
    assert_eq!(created["success"], true);
    assert_eq!(created["download_url"], "/api/ultimate-ai/download/table.csv");

    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/ultimate-ai/download/table.csv")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"table.csv\""
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"a,b\n1,2\n");
}

#[tokio::test]
async fn header_unsafe_file_names_never_reach_download() {
    let h = harness();
    let (status, created) = post(
        &h.app,
        "/api/ultimate-ai/create-file",
        json!({"content": "x", "filename": "a\nb", "format": "txt"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["success"], false);

    let (_, quoted) = post(
        &h.app,
        "/api/ultimate-ai/create-file",
        json!({"content": "x", "filename": "a\"b", "format": "txt"}),
    )
    .await;
    assert_eq!(quoted["success"], false);

    let (status, body) = get(&h.app, "/api/ultimate-ai/download/a%0Ab.txt").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], true);
    assert_eq!(body["detail"], "File not found");
}

#[tokio::test]
async fn missing_download_is_404_envelope() {
    let h = harness();
    let (status, body) = get(&h.app, "/api/ultimate-ai/download/nope.txt").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "File not found");
    assert_eq!(body["path"], "/api/ultimate-ai/download/nope.txt");
}

#[tokio::test]
async fn unknown_route_is_404_envelope() {
    let h = harness();
    let (status, body) = get(&h.app, "/api/ultimate-ai/teleport").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], true);
    assert_eq!(body["status_code"], 404);
    assert_eq!(body["path"], "/api/ultimate-ai/teleport");
}

// ============================================================================
// Analytics
// ============================================================================

#[tokio::test]
async fn analytics_reflect_recorded_calls() {
    let h = harness();
    post(&h.app, "/api/ultimate-ai/generate-text", json!({"prompt": "a"})).await;
    post(&h.app, "/api/ultimate-ai/generate-text", json!({"prompt": "explode"})).await;

    let (status, body) = get(&h.app, "/api/ultimate-ai/analytics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_requests"], 2);
    assert_eq!(body["error_count"], 1);
    assert_eq!(body["error_rate"], 50.0);
    assert_eq!(body["system_status"], "degraded");
    assert_eq!(body["capability_usage"]["text_generation"], 2);
    assert_eq!(body["models_status"]["text"], "active");

    let (_, usage) = get(&h.app, "/api/ultimate-ai/analytics/capabilities-usage").await;
    assert_eq!(usage["total_requests"], 2);

    let (_, perf) = get(&h.app, "/api/ultimate-ai/analytics/performance").await;
    assert!(perf["performance_metrics"]["average_response_time"].is_number());

    let (_, health) = get(&h.app, "/api/ultimate-ai/health").await;
    assert_eq!(health["system_status"], "degraded");
}

#[tokio::test]
async fn metrics_endpoint_is_flat() {
    let h = harness();
    post(&h.app, "/api/ultimate-ai/research-web", json!({"query": "q"})).await;

    let (status, body) = get(&h.app, "/api/ultimate-ai/metrics").await;

    assert_eq!(status, StatusCode::OK);
    let map = body.as_object().unwrap();
    assert_eq!(map.len(), 14);
    assert_eq!(map["tron_ai_total_requests"], 1.0);
    assert_eq!(map["tron_ai_capability_web_research_usage"], 1.0);
    assert_eq!(map["tron_ai_capability_image_creation_usage"], 0.0);
    assert!(map.values().all(Value::is_number));
}

#[tokio::test]
async fn capabilities_endpoint_lists_all_nine() {
    let h = harness();
    let (_, body) = get(&h.app, "/api/ultimate-ai/capabilities").await;

    assert_eq!(body["engine_info"]["capability_count"], 9);
    assert_eq!(body["capabilities"].as_object().unwrap().len(), 9);
    assert_eq!(body["capabilities"]["analytics_monitoring"]["model"], "Internal");
}

#[tokio::test]
async fn api_status_lists_backing_models_and_build() {
    let h = harness();
    let (status, body) = get(&h.app, "/api/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["api_status"], "operational");
    assert_eq!(body["capabilities"]["analytics_monitoring"], "internal");
    assert_eq!(body["capabilities"]["web_research"], "gemini-2.5-pro");
    assert_eq!(body["build"]["version"], tron_gateway::PKG_VERSION);
}

//! HTTP routes.
//!
//! Capability endpoints return HTTP 200 with `"success": false` when the
//! model call fails; only malformed requests, unknown routes and missing
//! downloads produce the error envelope.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{OriginalUri, Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;

use super::ApiError;
use crate::GatewayError;
use crate::analytics::{PerformanceMetrics, SystemStatus};
use crate::engine::{CapabilityInfo, Engine, SystemAnalytics};
use crate::types::{
    BrowserRequest, BrowserResult, Capability, CapabilityOutcome, CodeRequest, CodeResult,
    FileRequest, FileResult, ImageRequest, ImageResult, LiveRequest, LiveResult,
    ResearchRequest, ResearchResult, TextRequest, TextResult, WorkflowRequest, WorkflowResult,
};
use crate::version::{PKG_VERSION, build_info};

/// Base path of the capability API.
pub const API_PREFIX: &str = "/api/ultimate-ai";

const PLATFORM_NAME: &str = "TRON Ultimate AI Platform";

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<Engine>,
    missing_secrets: Arc<Vec<&'static str>>,
}

impl AppState {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            missing_secrets: Arc::new(Vec::new()),
        }
    }

    /// Environment variables reported as missing by `/health`.
    pub fn with_missing_secrets(mut self, missing: Vec<&'static str>) -> Self {
        self.missing_secrets = Arc::new(missing);
        self
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }
}

/// Build the gateway router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/status", get(system_status))
        .route("/health", get(api_health))
        .route("/capabilities", get(capabilities))
        .route("/generate-text", post(generate_text))
        .route("/generate-image", post(generate_image))
        .route("/research-web", post(research_web))
        .route("/execute-code", post(execute_code))
        .route("/control-browser", post(control_browser))
        .route("/create-file", post(create_file))
        .route("/live-interaction", post(live_interaction))
        .route("/execute-workflow", post(execute_workflow))
        .route("/download/:filename", get(download_file))
        .route("/analytics", get(analytics))
        .route("/analytics/capabilities-usage", get(capabilities_usage))
        .route("/analytics/performance", get(performance))
        .route("/analytics/models-status", get(models_status))
        .route("/metrics", get(metrics));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/status", get(api_status))
        .nest(API_PREFIX, api)
        .fallback(fallback)
        .with_state(state)
}

fn parse<T>(body: Result<Json<T>, JsonRejection>, uri: &Uri) -> Result<T, ApiError> {
    body.map(|Json(request)| request)
        .map_err(|rejection| ApiError::rejected(rejection, uri))
}

async fn fallback(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::not_found(&uri)
}

// ============================================================================
// Platform endpoints
// ============================================================================

#[derive(Serialize)]
struct RootResponse {
    platform: &'static str,
    version: &'static str,
    status: &'static str,
    timestamp: DateTime<Utc>,
    capabilities: usize,
    models: Vec<String>,
}

async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        platform: PLATFORM_NAME,
        version: PKG_VERSION,
        status: "operational",
        timestamp: Utc::now(),
        capabilities: Capability::COUNT,
        models: state
            .engine
            .models()
            .distinct_models()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let missing = state.missing_secrets.as_slice();
    let variables = if missing.is_empty() { "configured" } else { "missing" };
    let mut body = json!({
        "status": "healthy",
        "timestamp": Utc::now(),
        "version": PKG_VERSION,
        "environment": {
            "variables": variables,
            "missing_variables": missing,
        },
        "api_endpoints": {
            "ultimate_ai": API_PREFIX,
            "health": "/health",
        },
    });
    if !missing.is_empty() {
        body["status"] = json!("configuration_error");
        body["message"] = json!(format!(
            "Missing environment variables: {}",
            missing.join(", ")
        ));
    }
    Json(body)
}

async fn api_status(State(state): State<AppState>) -> Json<Value> {
    let models = state.engine.models();
    let capabilities: BTreeMap<&str, String> = Capability::ALL
        .into_iter()
        .map(|capability| {
            let descriptor = capability.descriptor();
            let backing = descriptor
                .model
                .map_or_else(|| "internal".to_string(), |role| models.get(role).to_string());
            (capability.as_str(), backing)
        })
        .collect();

    Json(json!({
        "api_status": "operational",
        "endpoints": {
            "ultimate_ai": {
                "base_url": API_PREFIX,
                "endpoints": [
                    "POST /generate-text",
                    "POST /generate-image",
                    "POST /research-web",
                    "POST /execute-code",
                    "POST /control-browser",
                    "POST /create-file",
                    "POST /live-interaction",
                    "POST /execute-workflow",
                    "GET /download/{filename}",
                    "GET /analytics",
                    "GET /capabilities",
                    "GET /metrics",
                ],
            },
        },
        "capabilities": capabilities,
        "build": build_info(),
        "timestamp": Utc::now(),
    }))
}

// ============================================================================
// Status and analytics
// ============================================================================

#[derive(Serialize)]
struct SystemStatusResponse {
    system: &'static str,
    timestamp: DateTime<Utc>,
    analytics: SystemAnalytics,
    capabilities: CapabilityInfo,
    uptime: &'static str,
}

async fn system_status(State(state): State<AppState>) -> Json<SystemStatusResponse> {
    Json(SystemStatusResponse {
        system: "operational",
        timestamp: Utc::now(),
        analytics: state.engine.analytics(),
        capabilities: state.engine.capability_info(),
        uptime: "active",
    })
}

#[derive(Serialize)]
struct ApiHealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: DateTime<Utc>,
    system_status: SystemStatus,
    total_requests: u64,
    error_count: u64,
    error_rate: f64,
    uptime_seconds: f64,
    capability_usage: BTreeMap<Capability, u64>,
}

async fn api_health(State(state): State<AppState>) -> Json<ApiHealthResponse> {
    let snapshot = state.engine.metrics().snapshot();
    Json(ApiHealthResponse {
        status: "healthy",
        version: PKG_VERSION,
        timestamp: snapshot.timestamp,
        system_status: snapshot.system_status,
        total_requests: snapshot.total_requests,
        error_count: snapshot.error_count,
        error_rate: snapshot.error_rate,
        uptime_seconds: snapshot.uptime_seconds,
        capability_usage: snapshot.capability_usage,
    })
}

async fn capabilities(State(state): State<AppState>) -> Json<CapabilityInfo> {
    Json(state.engine.capability_info())
}

async fn analytics(State(state): State<AppState>) -> Json<SystemAnalytics> {
    Json(state.engine.analytics())
}

#[derive(Serialize)]
struct UsageResponse {
    capability_usage: BTreeMap<Capability, u64>,
    total_requests: u64,
    timestamp: DateTime<Utc>,
}

async fn capabilities_usage(State(state): State<AppState>) -> Json<UsageResponse> {
    let snapshot = state.engine.metrics().snapshot();
    Json(UsageResponse {
        capability_usage: snapshot.capability_usage,
        total_requests: snapshot.total_requests,
        timestamp: snapshot.timestamp,
    })
}

#[derive(Serialize)]
struct PerformanceResponse {
    performance_metrics: PerformanceMetrics,
    error_rate: f64,
    uptime_seconds: f64,
    timestamp: DateTime<Utc>,
}

async fn performance(State(state): State<AppState>) -> Json<PerformanceResponse> {
    let snapshot = state.engine.metrics().snapshot();
    Json(PerformanceResponse {
        performance_metrics: snapshot.performance_metrics,
        error_rate: snapshot.error_rate,
        uptime_seconds: snapshot.uptime_seconds,
        timestamp: snapshot.timestamp,
    })
}

#[derive(Serialize)]
struct ModelsStatusResponse {
    models_status: BTreeMap<&'static str, &'static str>,
    capabilities_status: BTreeMap<Capability, bool>,
    timestamp: DateTime<Utc>,
}

async fn models_status(State(state): State<AppState>) -> Json<ModelsStatusResponse> {
    let analytics = state.engine.analytics();
    Json(ModelsStatusResponse {
        models_status: analytics.models_status,
        capabilities_status: analytics.capabilities_status,
        timestamp: analytics.snapshot.timestamp,
    })
}

async fn metrics(State(state): State<AppState>) -> Json<BTreeMap<String, f64>> {
    Json(state.engine.metrics().snapshot().flatten())
}

// ============================================================================
// Capabilities
// ============================================================================

async fn generate_text(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<CapabilityOutcome<TextResult>>, ApiError> {
    let request = parse(body, &uri)?;
    info!(prompt_len = request.prompt.len(), "text generation request");
    let outcome = state
        .engine
        .generate_text(&request.prompt, request.system.as_deref())
        .await;
    Ok(Json(outcome))
}

async fn generate_image(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<ImageRequest>, JsonRejection>,
) -> Result<Json<CapabilityOutcome<ImageResult>>, ApiError> {
    let request = parse(body, &uri)?;
    info!(prompt_len = request.prompt.len(), "image generation request");
    let outcome = state
        .engine
        .generate_image(&request.prompt, request.config)
        .await;
    Ok(Json(outcome))
}

async fn research_web(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<ResearchRequest>, JsonRejection>,
) -> Result<Json<CapabilityOutcome<ResearchResult>>, ApiError> {
    let request = parse(body, &uri)?;
    info!(query_len = request.query.len(), "web research request");
    let outcome = state
        .engine
        .research_web(&request.query, request.context.as_deref())
        .await;
    Ok(Json(outcome))
}

async fn execute_code(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<CodeRequest>, JsonRejection>,
) -> Result<Json<CapabilityOutcome<CodeResult>>, ApiError> {
    let request = parse(body, &uri)?;
    info!(language = %request.language, code_len = request.code.len(), "code execution request");
    let outcome = state
        .engine
        .execute_code(&request.code, &request.language, request.context.as_deref())
        .await;
    Ok(Json(outcome))
}

async fn control_browser(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<BrowserRequest>, JsonRejection>,
) -> Result<Json<CapabilityOutcome<BrowserResult>>, ApiError> {
    let request = parse(body, &uri)?;
    info!(url = ?request.url, "browser control request");
    let outcome = state
        .engine
        .control_browser(&request.task_description, request.url.as_deref())
        .await;
    Ok(Json(outcome))
}

async fn create_file(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<FileRequest>, JsonRejection>,
) -> Result<Json<CapabilityOutcome<FileResult>>, ApiError> {
    let request = parse(body, &uri)?;
    info!(filename = %request.filename, format = %request.format, "file creation request");
    let outcome = state
        .engine
        .create_file(&request.content, &request.filename, &request.format)
        .await;
    Ok(Json(outcome))
}

async fn live_interaction(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<LiveRequest>, JsonRejection>,
) -> Result<Json<CapabilityOutcome<LiveResult>>, ApiError> {
    let request = parse(body, &uri)?;
    info!(interaction_type = %request.interaction_type, "live interaction request");
    let outcome = state
        .engine
        .live_interaction(&request.interaction_type, request.data)
        .await;
    Ok(Json(outcome))
}

async fn execute_workflow(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<WorkflowRequest>, JsonRejection>,
) -> Result<Json<CapabilityOutcome<WorkflowResult>>, ApiError> {
    let request = parse(body, &uri)?;
    info!(tasks = request.tasks.len(), "workflow execution request");
    let outcome = state
        .engine
        .execute_workflow(&request.workflow_description, request.tasks)
        .await;
    Ok(Json(outcome))
}

async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    match state.engine.read_file(&filename).await {
        Ok(bytes) => {
            let disposition =
                HeaderValue::try_from(format!("attachment; filename=\"{filename}\"")).map_err(
                    |_| ApiError::new(StatusCode::NOT_FOUND, "File not found", &uri),
                )?;
            let headers = [
                (CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
                (CONTENT_DISPOSITION, disposition),
            ];
            Ok((headers, bytes).into_response())
        }
        Err(GatewayError::NotFound(_) | GatewayError::InvalidInput(_)) => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "File not found",
            &uri,
        )),
        Err(e) => Err(ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("File download failed: {e}"),
            &uri,
        )),
    }
}

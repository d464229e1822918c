// 🌐 HTTP API - axum routes over the analyzer, chart generator and keyword lookup
// Data is reloaded from disk on every request; the state only carries configuration.

use crate::analyzer::{AnalysisType, CollectionAnalyzer};
use crate::chart_detection::detect_chartable_content;
use crate::charts::{generate_chart_data, ChartData};
use crate::config::DataConfig;
use crate::dataset::Datasets;
use crate::error::{AnalyticsError, Result};
use crate::rag::rag_context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DataConfig>,
}

impl AppState {
    pub fn new(config: DataConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    success: Option<bool>,
    error: String,
}

/// Library error rendered as a flat `{error}` body
///
/// Request-shape errors map to 400, everything else to 500.
pub struct ApiError {
    source: AnalyticsError,
    with_success_flag: bool,
}

impl ApiError {
    fn flagged(source: AnalyticsError) -> Self {
        Self {
            source,
            with_success_flag: true,
        }
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(source: AnalyticsError) -> Self {
        Self {
            source,
            with_success_flag: false,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        AnalyticsError::InvalidBody(rejection.body_text()).into()
    }
}

/// Message sent to HTTP callers; the CLI keeps the detailed `Display` text
fn public_message(err: &AnalyticsError) -> String {
    match err {
        AnalyticsError::InvalidAnalysisType(_) => "Invalid analysisType".to_string(),
        other => other.to_string(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.source.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            error!(error = %self.source, "Request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = ErrorBody {
            success: self.with_success_flag.then_some(false),
            error: public_message(&self.source),
        };

        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub analysis_type: Option<String>,
    /// Accepted but unused; the portfolio always comes from the data directory
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRequest {
    #[serde(default)]
    pub chart_type: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContextRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChartResponse {
    success: bool,
    chart_data: ChartData,
}

/// Non-empty field or `MissingField`
fn required(value: Option<String>, field: &'static str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AnalyticsError::MissingField(field)),
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/analyze - Portfolio summary
async fn get_summary(State(state): State<AppState>) -> std::result::Result<Response, ApiError> {
    let analyzer = CollectionAnalyzer::from_path(&state.config.portfolio_path())?;
    let summary = analyzer.summary_stats()?;

    Ok(Json(serde_json::json!({
        "summary": summary,
        "timestamp": Local::now(),
    }))
    .into_response())
}

/// POST /api/analyze - Run one analysis over the portfolio
async fn post_analyze(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AnalyzeRequest>, JsonRejection>,
) -> std::result::Result<Response, ApiError> {
    let Json(request) = payload?;
    let analysis: AnalysisType = required(request.analysis_type, "analysisType")?.parse()?;
    info!(analysis = %analysis, "POST /api/analyze");

    let analyzer = CollectionAnalyzer::from_path(&state.config.portfolio_path())?;
    let result = analyzer.run(analysis)?;

    Ok(Json(serde_json::json!({
        "analysis": result,
        "timestamp": Local::now(),
    }))
    .into_response())
}

/// POST /api/chart - Chart-ready series
async fn post_chart(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChartRequest>, JsonRejection>,
) -> std::result::Result<Response, ApiError> {
    let Json(request) = payload?;
    let chart_type = required(request.chart_type, "chartType")?;
    let query = request.query.unwrap_or_default();
    info!(chart_type = %chart_type, query = %query, "POST /api/chart");

    let chart_data =
        generate_chart_data(&chart_type, &query, &state.config).map_err(ApiError::flagged)?;

    Ok(Json(ChartResponse {
        success: true,
        chart_data,
    })
    .into_response())
}

/// POST /api/context - Keyword lookup over the knowledge base
async fn post_context(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ContextRequest>, JsonRejection>,
) -> std::result::Result<Response, ApiError> {
    let Json(request) = payload?;
    let query = required(request.query, "query")?;
    let context = rag_context(&query, || Datasets::load(&state.config));

    Ok(Json(serde_json::json!({ "context": context })).into_response())
}

/// POST /api/detect-chart - Is this answer worth a chart?
async fn post_detect_chart(
    payload: std::result::Result<Json<DetectRequest>, JsonRejection>,
) -> std::result::Result<Response, ApiError> {
    let Json(request) = payload?;
    let content = required(request.content, "content")?;
    let query = request.query.unwrap_or_default();
    let detection = detect_chartable_content(&content, &query)?;

    Ok(Json(detection).into_response())
}

// ============================================================================
// Router
// ============================================================================

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/analyze", get(get_summary).post(post_analyze))
        .route("/chart", post(post_chart))
        .route("/context", post(post_context))
        .route("/detect-chart", post(post_detect_chart))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

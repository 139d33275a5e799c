//! HTTP Endpoints
//!
//! REST API for the calculators and the assistant.

use std::time::Duration;

use axum::{
    extract::{Json, Path, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use finlit_calculators::{display_fields, CalculatorOutput, CalculatorRequest, ChartData};
use finlit_chat::ChatReply;
use finlit_client::RetryPolicy;
use finlit_core::ChatExchange;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::ServerError;

const DEV_ORIGIN: &str = "http://localhost:3000";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let config = state.get_config();
    let cors_layer = build_cors_layer(&config.server.cors_origins, config.server.cors_enabled);
    // Outlasts the worst case of the chat retry policy
    let request_timeout =
        RetryPolicy::from_chat_config(&config.chat).worst_case() + Duration::from_secs(5);
    drop(config);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/calculate", post(calculate))
        .route(
            "/api/assistant/:session_id",
            post(ask_assistant).get(get_history).delete(clear_history),
        )
        .route("/admin/reload-config", post(reload_config))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If cors_origins is empty or all invalid, allows only the local dev origin
/// - Otherwise, uses the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if parsed_origins.is_empty() {
        tracing::info!("No usable CORS origins configured, defaulting to {}", DEV_ORIGIN);
        return layer.allow_origin(HeaderValue::from_static(DEV_ORIGIN));
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    layer.allow_origin(parsed_origins)
}

/// Health check
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.get_config();
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": config.environment,
        "uptime_secs": state.uptime_secs(),
        "chat_sessions": state.session_count(),
    }))
}

/// Calculator response
#[derive(Debug, Serialize)]
pub struct CalculateResponse {
    pub result: CalculatorOutput,
    /// Headline figures formatted as rupees
    pub display: BTreeMap<String, String>,
    /// Invested/returns series for growth calculators
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartData>,
}

/// Run a calculator
async fn calculate(
    State(state): State<AppState>,
    Json(request): Json<CalculatorRequest>,
) -> Result<Json<CalculateResponse>, ServerError> {
    let kind = request.kind();
    let result = state.calculators.read().evaluate(&request)?;
    tracing::debug!(%kind, "Calculator evaluated");

    let chart = result.growth().map(|growth| ChartData::from_series(&growth.series));
    Ok(Json(CalculateResponse {
        display: display_fields(&result),
        chart,
        result,
    }))
}

/// Assistant request body
#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
    pub message: String,
}

/// Ask the assistant
async fn ask_assistant(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<AssistantRequest>,
) -> Result<Json<ChatReply>, ServerError> {
    let session = state.session(&session_id)?;
    let reply = state.chat.ask(&session, &request.message).await?;
    Ok(Json(reply))
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub history: Vec<ChatExchange>,
}

/// Session history
async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<HistoryResponse>, ServerError> {
    let session = state
        .existing_session(&session_id)
        .ok_or_else(|| ServerError::NotFound(format!("session {}", session_id)))?;

    Ok(Json(HistoryResponse {
        session_id,
        history: session.history(),
    }))
}

/// Clear session history and close the session
async fn clear_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ServerError> {
    let session = state
        .existing_session(&session_id)
        .ok_or_else(|| ServerError::NotFound(format!("session {}", session_id)))?;
    if session.is_busy() {
        return Err(ServerError::Conflict("a request is in flight for this session".into()));
    }
    session.clear();
    state.remove_session(&session_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Reload configuration from disk
async fn reload_config(State(state): State<AppState>) -> impl IntoResponse {
    match state.reload_config() {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "reloaded" })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

//! Finlit Server
//!
//! HTTP endpoints for the calculators and the chat assistant.

pub mod http;
pub mod session;
pub mod state;

pub use http::create_router;
pub use session::SessionManager;
pub use state::{AppState, LogNavigator};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use finlit_calculators::ValidationError;
use finlit_chat::ChatError;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl From<ChatError> for ServerError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Busy => ServerError::Conflict(err.to_string()),
            ChatError::EmptyMessage | ChatError::MessageTooLong(_, _) => {
                ServerError::InvalidRequest(err.to_string())
            },
            ChatError::Rules(_) => ServerError::Config(err.to_string()),
        }
    }
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
            ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = match &self {
            ServerError::Validation(e) => serde_json::json!({
                "error": "validation_failed",
                "fields": e.errors,
            }),
            ServerError::InvalidRequest(message)
            | ServerError::NotFound(message)
            | ServerError::Conflict(message)
            | ServerError::Unavailable(message) => {
                serde_json::json!({ "error": message })
            },
            ServerError::Config(_) => {
                tracing::error!(error = %self, "Request failed");
                serde_json::json!({ "error": "Something went wrong. Please try again." })
            },
        };
        (StatusCode::from(self), Json(body)).into_response()
    }
}

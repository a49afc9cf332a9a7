//! Career Assistant Server
//!
//! HTTP endpoints for the completion proxy and notification relay, plus the
//! live-chat WebSocket.

pub mod assistant;
pub mod geo;
pub mod http;
pub mod live_chat;
pub mod metrics;
pub mod notifications;
pub mod state;
pub mod visitor;

pub use http::create_router;
pub use live_chat::LiveChatHub;
pub use metrics::init_metrics;
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use career_assistant_config::constants::errors;

/// Request failures. The display text is the `error` field sent to the client.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{}", errors::METHOD_NOT_ALLOWED)]
    MethodNotAllowed,

    #[error("{0}")]
    BadRequest(&'static str),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Unavailable(&'static str),

    /// Completion service answered with a non-success status
    #[error("AI service error: {status}")]
    Upstream { status: u16 },

    #[error("{0}")]
    Internal(&'static str),

    #[error("Startup error: {0}")]
    Startup(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Upstream { status } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            },
            ServerError::Internal(_) | ServerError::Startup(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_and_text() {
        let err = ServerError::Upstream { status: 529 };
        assert_eq!(err.to_string(), errors::upstream(529));
        assert_eq!(err.status().as_u16(), 529);
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(ServerError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(ServerError::BadRequest(errors::INVALID_BODY).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ServerError::Internal(errors::SEND_FAILED).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

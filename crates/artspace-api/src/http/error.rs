//! Application error type mapping to HTTP status codes.
//!
//! Every failure is rendered as `{ "error": "<message>" }`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use artspace_types::error::{AuthError, ChatError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Chat domain errors.
    Chat(ChatError),
    /// Malformed request input.
    Validation(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Chat(e.into())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Chat(ChatError::Unauthenticated(_)) => StatusCode::UNAUTHORIZED,
            AppError::Chat(ChatError::Forbidden(_)) => StatusCode::FORBIDDEN,
            AppError::Chat(ChatError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Chat(ChatError::BadRequest(_)) | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Chat(ChatError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Chat(e) => e.to_string(),
            AppError::Validation(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!(%status, error = %message, "request failed");
        } else {
            tracing::debug!(%status, error = %message, "request rejected");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(sqlx::Error),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    /// A backend failure whose message is returned to the caller as-is.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Turns a database failure into one whose message reaches the caller.
    pub fn exposed(self) -> Self {
        match self {
            AppError::Db(e) => AppError::Internal(e.to_string()),
            other => other,
        }
    }
}

fn error_body(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(json!({ "error": msg.into() }))).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(msg) => error_body(StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => error_body(StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => error_body(StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Db(_) => error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(value: sqlx::Error) -> Self {
        AppError::Db(value)
    }
}

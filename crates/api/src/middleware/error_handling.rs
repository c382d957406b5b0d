//! # Error Handling Middleware
//!
//! Maps domain errors to HTTP status codes and a `{"error": "..."}` JSON body so
//! every endpoint reports failures the same way.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use slotbook_core::errors::CalError;
use tracing::error;

/// Application error wrapper that provides HTTP status code mapping
///
/// Handlers return `Result<_, AppError>` and use `?` on anything producing a
/// [`CalError`] or an `eyre::Report`.
#[derive(Debug)]
pub struct AppError(pub CalError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CalError::NotFound(_) => StatusCode::NOT_FOUND,
            CalError::Validation(_) | CalError::InvalidRange(_) => StatusCode::BAD_REQUEST,
            CalError::Conflict(_) | CalError::AlreadyCancelled(_) => StatusCode::CONFLICT,
            CalError::Authentication(_) => StatusCode::UNAUTHORIZED,
            CalError::Database(_) | CalError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {:?}", self.0);
        }

        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl From<CalError> for AppError {
    fn from(err: CalError) -> Self {
        AppError(err)
    }
}

/// Storage helpers return `eyre::Result`; their failures surface as 500s.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(CalError::Database(err))
    }
}

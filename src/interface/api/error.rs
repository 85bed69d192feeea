//! Domain error to HTTP response mapping

use super::dto::ErrorResponse;
use crate::domain::shared::DomainError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

pub const MISSING_FIELDS: &str = "Missing required fields";
pub const DEALER_NOT_FOUND: &str = "Dealer not found";

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

pub fn not_found(what: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("{} not found", what))
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        match self {
            DomainError::DependencyNotFound(_) => {
                error_response(StatusCode::BAD_REQUEST, DEALER_NOT_FOUND)
            }
            DomainError::NotFound(what) => error_response(StatusCode::NOT_FOUND, what),
            DomainError::Validation(msg) => error_response(StatusCode::BAD_REQUEST, msg),
            DomainError::Database(msg) | DomainError::Internal(msg) => {
                error!("API: internal failure: {}", msg);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        }
    }
}

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use assetdesk_auth::AuthzError;
use assetdesk_core::DomainError;
use assetdesk_infra::StoreError;

/// Every error a handler can return. Rendered as
/// `{"error": <code>, "message": <text>}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Store(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Store(StoreError::Domain(err)) => domain_error_to_response(err),
            ApiError::Store(StoreError::Transient(msg)) => {
                tracing::warn!(error = %msg, "transient storage failure");
                json_error(StatusCode::SERVICE_UNAVAILABLE, "unavailable", "temporarily unavailable, retry")
            }
            ApiError::Store(StoreError::Internal(msg)) => {
                tracing::error!(error = %msg, "storage failure");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
            }
            ApiError::Forbidden(e) => json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()),
            ApiError::Unauthorized(msg) => json_error(StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_input", msg),
            ApiError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::InvalidInput(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_input", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::InvalidState(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_state", msg),
        DomainError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", format!("{msg} not found")),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

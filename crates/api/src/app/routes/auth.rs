use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::{extract::Extension, Json};

use crate::app::dto::{LoginRequest, LoginResponse};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(body) = body?;

    match services.sessions.login(body.username.trim(), &body.password)? {
        Some(session) => {
            tracing::info!(username = %body.username.trim(), role = %session.role, "login succeeded");
            Ok(Json(session))
        }
        None => {
            tracing::info!(username = %body.username.trim(), "login rejected");
            Err(ApiError::Unauthorized("invalid credentials"))
        }
    }
}

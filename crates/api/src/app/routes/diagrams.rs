use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::Value as JsonValue;

use assetdesk_auth::Permission;
use assetdesk_infra::diagrams::{DiagramStore, DiagramSummary, StorageStatus};

use crate::app::errors::ApiError;
use crate::app::routes::common::CmdAuth;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_diagrams).post(create_diagram))
        .route("/:id", get(get_diagram).put(save_diagram).delete(delete_diagram))
}

/// Public: lets the client decide whether to offer server-side saving.
pub async fn storage_status(Extension(services): Extension<Arc<AppServices>>) -> Json<StorageStatus> {
    Json(services.storage_status.clone())
}

fn store(services: &AppServices) -> Result<&DiagramStore, ApiError> {
    services
        .diagrams
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("server storage is disabled".to_string()))
}

pub async fn list_diagrams(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Json<Vec<DiagramSummary>>, ApiError> {
    crate::authz::require(&principal, Permission::DIAGRAMS_READ)?;
    Ok(Json(store(&services)?.list().await?))
}

pub async fn get_diagram(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Json<JsonValue>, ApiError> {
    crate::authz::require(&principal, Permission::DIAGRAMS_READ)?;
    Ok(Json(store(&services)?.get(&id).await?))
}

pub async fn create_diagram(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CmdAuth::new(body?.0, Permission::DIAGRAMS_WRITE);
    crate::authz::authorize_command(&principal, &cmd)?;

    let id = store(&services)?.create(cmd.inner).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "id": id })),
    ))
}

pub async fn save_diagram(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CmdAuth::new(body?.0, Permission::DIAGRAMS_WRITE);
    crate::authz::authorize_command(&principal, &cmd)?;

    store(&services)?.save(&id, cmd.inner).await?;
    Ok(Json(serde_json::json!({ "success": true, "id": id })))
}

pub async fn delete_diagram(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    crate::authz::require(&principal, Permission::DIAGRAMS_WRITE)?;

    store(&services)?.delete(&id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

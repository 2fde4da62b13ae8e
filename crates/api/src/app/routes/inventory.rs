use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use assetdesk_auth::Permission;
use assetdesk_core::InventoryItemId;
use assetdesk_infra::MoveRequest;
use assetdesk_inventory::{InventoryItem, InventoryItemPatch, NewInventoryItem};

use crate::app::dto::{InventoryListQuery, PageQuery};
use crate::app::errors::ApiError;
use crate::app::routes::common::{parse_id, CmdAuth};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/:id", get(get_item).put(update_item).delete(delete_item))
        .route("/:id/move", post(move_stock))
        .route("/:id/movements", get(list_movements))
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<Query<InventoryListQuery>, QueryRejection>,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    crate::authz::require(&principal, Permission::INVENTORY_READ)?;
    let Query(query) = query?;

    let items = services.inventory.list(&query.filter()?, query.pagination()).await?;
    Ok(Json(items))
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Json<InventoryItem>, ApiError> {
    crate::authz::require(&principal, Permission::INVENTORY_READ)?;
    let id: InventoryItemId = parse_id(&id)?;
    Ok(Json(services.inventory.get(id).await?))
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<NewInventoryItem>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CmdAuth::new(body?.0, Permission::INVENTORY_WRITE);
    crate::authz::authorize_command(&principal, &cmd)?;

    let item = services.inventory.create(cmd.inner, &principal.actor()).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<InventoryItemPatch>, JsonRejection>,
) -> Result<Json<InventoryItem>, ApiError> {
    let cmd = CmdAuth::new(body?.0, Permission::INVENTORY_WRITE);
    crate::authz::authorize_command(&principal, &cmd)?;
    let id: InventoryItemId = parse_id(&id)?;

    Ok(Json(services.inventory.update(id, cmd.inner, &principal.actor()).await?))
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    crate::authz::require(&principal, Permission::INVENTORY_WRITE)?;
    let id: InventoryItemId = parse_id(&id)?;

    services.inventory.delete(id, &principal.actor()).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Apply one stock movement; responds with the item at its new stock level.
pub async fn move_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<InventoryItem>, ApiError> {
    let cmd = CmdAuth::new(body?.0, Permission::INVENTORY_MOVE);
    crate::authz::authorize_command(&principal, &cmd)?;
    let id: InventoryItemId = parse_id(&id)?;

    let outcome = services.ledger.apply_movement(id, cmd.inner, &principal.actor()).await?;
    Ok(Json(outcome.item))
}

pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    crate::authz::require(&principal, Permission::INVENTORY_READ)?;
    let id: InventoryItemId = parse_id(&id)?;
    let Query(page) = query?;

    let movements = services.ledger.history(id, page.pagination()).await?;
    Ok(Json(serde_json::json!({ "movements": movements })))
}

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use assetdesk_assets::{Asset, AssetPatch, NewAsset};
use assetdesk_auth::Permission;
use assetdesk_core::AssetId;

use crate::app::dto::AssetListQuery;
use crate::app::errors::ApiError;
use crate::app::routes::common::{parse_id, CmdAuth};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_assets).post(create_asset))
        .route("/:id", get(get_asset).put(update_asset).delete(delete_asset))
}

pub async fn list_assets(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<Query<AssetListQuery>, QueryRejection>,
) -> Result<Json<Vec<Asset>>, ApiError> {
    crate::authz::require(&principal, Permission::ASSETS_READ)?;
    let Query(query) = query?;

    let assets = services.assets.list(&query.filter()?, query.pagination()).await?;
    Ok(Json(assets))
}

pub async fn get_asset(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Json<Asset>, ApiError> {
    crate::authz::require(&principal, Permission::ASSETS_READ)?;
    let id: AssetId = parse_id(&id)?;
    Ok(Json(services.assets.get(id).await?))
}

pub async fn create_asset(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<NewAsset>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CmdAuth::new(body?.0, Permission::ASSETS_WRITE);
    crate::authz::authorize_command(&principal, &cmd)?;

    let asset = services.assets.create(cmd.inner, &principal.actor()).await?;
    Ok((StatusCode::CREATED, Json(asset)))
}

pub async fn update_asset(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<AssetPatch>, JsonRejection>,
) -> Result<Json<Asset>, ApiError> {
    let cmd = CmdAuth::new(body?.0, Permission::ASSETS_WRITE);
    crate::authz::authorize_command(&principal, &cmd)?;
    let id: AssetId = parse_id(&id)?;

    Ok(Json(services.assets.update(id, cmd.inner, &principal.actor()).await?))
}

pub async fn delete_asset(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    crate::authz::require(&principal, Permission::ASSETS_WRITE)?;
    let id: AssetId = parse_id(&id)?;

    services.assets.delete(id, &principal.actor()).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

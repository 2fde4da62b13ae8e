use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Extension, Query};
use axum::response::IntoResponse;
use axum::Json;

use assetdesk_auth::Permission;

use crate::app::dto::ActivityQuery;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub async fn list_activity(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<Query<ActivityQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    crate::authz::require(&principal, Permission::ACTIVITY_READ)?;
    let Query(query) = query?;

    let logs = services.audit.list(&query.filter()?, query.pagination()).await?;
    Ok(Json(serde_json::json!({ "logs": logs })))
}

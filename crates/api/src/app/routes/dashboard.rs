use std::sync::Arc;

use axum::{extract::Extension, Json};

use assetdesk_auth::Permission;
use assetdesk_infra::dashboard::DashboardSummary;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub async fn summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Json<DashboardSummary>, ApiError> {
    crate::authz::require(&principal, Permission::DASHBOARD_READ)?;
    Ok(Json(services.dashboard.summary().await?))
}

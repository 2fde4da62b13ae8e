use axum::{routing::get, Router};

pub mod activity;
pub mod assets;
pub mod auth;
pub mod common;
pub mod dashboard;
pub mod diagrams;
pub mod inventory;
pub mod system;

/// Router for all authenticated endpoints (nested under `/api`).
pub fn router(diagrams_enabled: bool) -> Router {
    let router = Router::new()
        .route("/whoami", get(system::whoami))
        .route("/dashboard/summary", get(dashboard::summary))
        .nest("/assets", assets::router())
        .nest("/inventory", inventory::router())
        .route("/activity", get(activity::list_activity));

    if diagrams_enabled {
        router.nest("/diagrams", diagrams::router())
    } else {
        router
    }
}

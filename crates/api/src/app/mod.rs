//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage backend selection and service construction
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs and query parsing
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{routing::get, routing::post, Extension, Router};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use assetdesk_infra::StoreError;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Diagram documents can be large.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Build the full HTTP router from already-built services.
pub fn build_router(services: Arc<AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        jwt: services.sessions.validator(),
    };
    let diagrams_enabled = services.diagrams.is_some();

    // Protected routes: require a valid bearer token.
    let protected = routes::router(diagrams_enabled).layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    let public = Router::new()
        .route("/auth/login", post(routes::auth::login))
        .route("/storage/status", get(routes::diagrams::storage_status));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", public.merge(protected))
        .layer(Extension(services))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES)),
        )
}

/// Build services and router in one step (used by tests and embedders).
pub async fn build_app(config: &ApiConfig) -> Result<(Router, Arc<AppServices>), StoreError> {
    let services = Arc::new(services::build_services(config).await?);
    Ok((build_router(services.clone()), services))
}

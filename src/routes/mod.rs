//! Router assembly: API routes, service routes, static files.

mod common;
mod entity;

pub use common::common_routes_with_ready;
pub use entity::entity_routes;

use crate::config::AppConfig;
use crate::state::AppState;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;

/// Full application router. Paths outside the API fall back to static files when configured.
pub fn app_router(state: AppState, config: &AppConfig) -> Router {
    let router = Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .merge(entity_routes(state))
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(config.body_limit)));
    match &config.static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true)),
        None => router,
    }
}

//! Table CRUD routes under /api. Handlers resolve the table from the path segment.

use crate::handlers::entity::{create, delete as delete_handler, list_tables, select_all, update};
use crate::state::AppState;
use axum::{routing::get, routing::put, Router};

pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/tables", get(list_tables))
        .route("/api/:table", get(select_all).post(create))
        .route("/api/:table/:id", put(update).delete(delete_handler))
        .with_state(state)
}

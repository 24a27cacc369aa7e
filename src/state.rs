//! Shared application state for all routes.

use crate::service::CrudService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CrudService>,
}

impl AppState {
    pub fn new(service: Arc<CrudService>) -> Self {
        AppState { service }
    }
}

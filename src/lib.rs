//! Bookstore catalog: schema-driven CRUD over PostgreSQL with console and REST front ends.

pub mod config;
pub mod console;
pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::AppConfig;
pub use console::Console;
pub use error::{ConfigError, CrudError, FieldError};
pub use routes::{app_router, common_routes_with_ready, entity_routes};
pub use service::{CrudOutcome, CrudRequest, CrudService, RawField};
pub use state::AppState;
pub use store::{PgStore, RowSet, Store};

//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Bad environment value at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// One rejected input field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum CrudError {
    #[error("unknown table: {0}")]
    UnknownTable(String),
    #[error("validation failed: {}", summarize(.0))]
    ValidationFailed(Vec<FieldError>),
    #[error("no fields to update")]
    NoFieldsToUpdate,
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("not found: {table} id '{id}'")]
    NotFound { table: String, id: String },
    #[error("connection: {0}")]
    Connection(String),
    #[error("store: {0}")]
    Store(String),
}

impl From<sqlx::Error> for CrudError {
    fn from(e: sqlx::Error) -> Self {
        CrudError::Store(e.to_string())
    }
}

impl CrudError {
    pub fn code(&self) -> &'static str {
        match self {
            CrudError::UnknownTable(_) => "unknown_table",
            CrudError::ValidationFailed(_) => "validation_error",
            CrudError::NoFieldsToUpdate => "no_fields_to_update",
            CrudError::InvalidBody(_) => "invalid_body",
            CrudError::UnsupportedOperation(_) => "unsupported_operation",
            CrudError::NotFound { .. } => "not_found",
            CrudError::Connection(_) => "connection_error",
            CrudError::Store(_) => "store_error",
        }
    }

    /// Field names rejected by validation, in report order. Empty for other errors.
    pub fn invalid_fields(&self) -> Vec<&str> {
        match self {
            CrudError::ValidationFailed(errors) => errors.iter().map(|e| e.field.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for CrudError {
    fn into_response(self) -> Response {
        let status = match &self {
            CrudError::NotFound { .. } => StatusCode::NOT_FOUND,
            CrudError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_REQUEST,
        };
        let details = match &self {
            CrudError::ValidationFailed(errors) => serde_json::to_value(errors).ok(),
            _ => None,
        };
        tracing::warn!(code = self.code(), error = %self, "request rejected");
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}

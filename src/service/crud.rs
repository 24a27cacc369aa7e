//! Generic CRUD execution: validate, build, execute, report.

use crate::error::{CrudError, FieldError};
use crate::schema::{self, TableDescriptor};
use crate::service::validation::validate;
use crate::sql::{build, FieldValue, Operation, PgBindValue};
use crate::store::{RowSet, Store};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// One raw input field as received from a front end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawField {
    pub name: String,
    pub value: String,
}

impl RawField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        RawField {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A single CRUD call. Built per interaction, never reused.
#[derive(Clone, Debug)]
pub struct CrudRequest {
    pub table: String,
    pub operation: Operation,
    pub target_id: Option<String>,
    pub fields: Vec<RawField>,
}

impl CrudRequest {
    pub fn insert(table: impl Into<String>, fields: Vec<RawField>) -> Self {
        CrudRequest {
            table: table.into(),
            operation: Operation::Insert,
            target_id: None,
            fields,
        }
    }

    pub fn select_all(table: impl Into<String>) -> Self {
        CrudRequest {
            table: table.into(),
            operation: Operation::SelectAll,
            target_id: None,
            fields: Vec::new(),
        }
    }

    pub fn update(table: impl Into<String>, id: impl Into<String>, fields: Vec<RawField>) -> Self {
        CrudRequest {
            table: table.into(),
            operation: Operation::UpdateById,
            target_id: Some(id.into()),
            fields,
        }
    }

    pub fn delete(table: impl Into<String>, id: impl Into<String>) -> Self {
        CrudRequest {
            table: table.into(),
            operation: Operation::DeleteById,
            target_id: Some(id.into()),
            fields: Vec::new(),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum CrudOutcome {
    Rows(RowSet),
    Done,
}

/// CRUD engine over one owned store. Statement execution is serialized through `gate`.
pub struct CrudService {
    store: Arc<dyn Store>,
    gate: Mutex<()>,
    timeout: Duration,
}

impl CrudService {
    pub fn new(store: Arc<dyn Store>, timeout: Duration) -> Self {
        CrudService {
            store,
            gate: Mutex::new(()),
            timeout,
        }
    }

    pub async fn execute(&self, request: &CrudRequest) -> Result<CrudOutcome, CrudError> {
        let table = schema::resolve(&request.table)
            .ok_or_else(|| CrudError::UnknownTable(request.table.clone()))?;

        let mut errors = Vec::new();
        let fields = match request.operation {
            Operation::Insert => validate_fields(table, &request.fields, true, &mut errors),
            Operation::UpdateById => validate_fields(table, &request.fields, false, &mut errors),
            Operation::SelectAll | Operation::DeleteById => Vec::new(),
        };
        let target_id = match request.operation {
            Operation::UpdateById | Operation::DeleteById => {
                validate_target(table, request.target_id.as_deref(), &mut errors)
            }
            Operation::Insert | Operation::SelectAll => None,
        };
        if !errors.is_empty() {
            return Err(CrudError::ValidationFailed(errors));
        }

        let q = build(table, request.operation, &fields, target_id.as_ref())?;

        match request.operation {
            Operation::SelectAll => {
                let mut rows = self.guarded(self.store.query(&q.sql, &q.params)).await?;
                rows.columns = table.column_names().map(str::to_string).collect();
                Ok(CrudOutcome::Rows(rows))
            }
            op => {
                let affected = self.guarded(self.store.exec(&q.sql, &q.params)).await?;
                tracing::info!(table = table.name, operation = ?op, affected, "statement applied");
                if affected == 0 && op != Operation::Insert {
                    return Err(CrudError::NotFound {
                        table: table.name.to_string(),
                        id: request.target_id.clone().unwrap_or_default(),
                    });
                }
                Ok(CrudOutcome::Done)
            }
        }
    }

    /// Round-trip to the store for readiness checks.
    pub async fn ping(&self) -> Result<(), CrudError> {
        self.guarded(self.store.query("SELECT 1", &[])).await.map(|_| ())
    }

    /// Run one store call with exclusive access and a bounded wait.
    async fn guarded<T, F>(&self, call: F) -> Result<T, CrudError>
    where
        F: Future<Output = Result<T, CrudError>>,
    {
        let _permit = self.gate.lock().await;
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| CrudError::Store(format!("statement timed out after {:?}", self.timeout)))?
    }
}

/// Validate every supplied field, collecting all failures. On insert, missing required columns fail too.
fn validate_fields(
    table: &'static TableDescriptor,
    raw: &[RawField],
    is_insert: bool,
    errors: &mut Vec<FieldError>,
) -> Vec<FieldValue> {
    let mut out = Vec::with_capacity(raw.len());
    let mut seen = HashSet::new();
    for f in raw {
        let Some(column) = table.column(&f.name) else {
            errors.push(FieldError::new(&f.name, format!("is not a column of {}", table.name)));
            continue;
        };
        let Some(spec) = column.field else {
            errors.push(FieldError::new(&f.name, "is read-only"));
            continue;
        };
        if !seen.insert(column.name) {
            errors.push(FieldError::new(&f.name, "is supplied more than once"));
            continue;
        }
        match validate(&f.value, &spec) {
            Ok(v) => out.push(FieldValue {
                column,
                value: PgBindValue::from(v),
            }),
            Err(message) => errors.push(FieldError::new(&f.name, message)),
        }
    }
    if is_insert {
        for column in table.writable_columns() {
            let required = column.field.map(|s| s.required).unwrap_or(false);
            if required && !seen.contains(column.name) {
                errors.push(FieldError::new(column.name, "is required"));
            }
        }
    }
    out
}

fn validate_target(
    table: &TableDescriptor,
    id: Option<&str>,
    errors: &mut Vec<FieldError>,
) -> Option<PgBindValue> {
    let field = table.key_column.unwrap_or("id");
    match validate(id.unwrap_or(""), &table.key_spec()) {
        Ok(v) => Some(PgBindValue::from(v)),
        Err(message) => {
            errors.push(FieldError::new(field, message));
            None
        }
    }
}

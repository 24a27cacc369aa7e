//! Store execution primitive: one owned PostgreSQL connection behind the `Store` trait.

use crate::config::AppConfig;
use crate::error::CrudError;
use crate::sql::PgBindValue;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row};

/// Result of a query: column names plus rows in column order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Run a statement that returns rows.
    async fn query(&self, sql: &str, params: &[PgBindValue]) -> Result<RowSet, CrudError>;

    /// Run a statement and return the number of rows affected.
    async fn exec(&self, sql: &str, params: &[PgBindValue]) -> Result<u64, CrudError>;

    /// Release the underlying connection. Idempotent.
    async fn close(&self);
}

/// PostgreSQL store backed by a pool capped at a single connection.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn open(config: &AppConfig) -> Result<Self, CrudError> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(config.store_timeout)
            .connect(&config.database_url)
            .await
            .map_err(|e| CrudError::Connection(e.to_string()))?;
        tracing::info!("database connection established");
        Ok(PgStore { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

fn bind_all<'q>(
    sql: &'q str,
    params: &'q [PgBindValue],
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    let mut query = sqlx::query(sql);
    for p in params {
        query = query.bind(p.clone());
    }
    query
}

#[async_trait]
impl Store for PgStore {
    async fn query(&self, sql: &str, params: &[PgBindValue]) -> Result<RowSet, CrudError> {
        tracing::debug!(sql = %sql, params = ?params, "query");
        let rows = bind_all(sql, params).fetch_all(&self.pool).await?;
        let columns = rows
            .first()
            .map(|r| r.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        Ok(RowSet {
            columns,
            rows: rows.iter().map(row_to_values).collect(),
        })
    }

    async fn exec(&self, sql: &str, params: &[PgBindValue]) -> Result<u64, CrudError> {
        tracing::debug!(sql = %sql, params = ?params, "exec");
        let result = bind_all(sql, params).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
            tracing::info!("database connection closed");
        }
    }
}

fn row_to_values(row: &PgRow) -> Vec<Value> {
    (0..row.columns().len()).map(|i| cell_to_value(row, i)).collect()
}

fn cell_to_value(row: &PgRow, index: usize) -> Value {
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(index) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(index) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(index) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(index) {
        if let Some(n) = serde_json::Number::from_f64(n as f64) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(index) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(index) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(index) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(index) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(index) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(index) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<serde_json::Value>, _>(index) {
        return j;
    }
    Value::Null
}

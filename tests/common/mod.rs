//! Test doubles shared by integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bookstore::sql::PgBindValue;
use bookstore::{CrudError, CrudService, RowSet, Store};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every statement and tracks how many run at once.
#[derive(Default)]
pub struct SpyStore {
    pub calls: Mutex<Vec<(String, Vec<PgBindValue>)>>,
    pub rows: RowSet,
    pub affected: u64,
    pub delay: Duration,
    pub fail_with: Option<String>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl SpyStore {
    pub fn new() -> Self {
        SpyStore {
            affected: 1,
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> (String, Vec<PgBindValue>) {
        self.calls.lock().unwrap().last().cloned().expect("no store call recorded")
    }

    async fn record(&self, sql: &str, params: &[PgBindValue]) -> Result<(), CrudError> {
        self.calls.lock().unwrap().push((sql.to_string(), params.to_vec()));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(message) => Err(CrudError::Store(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Store for SpyStore {
    async fn query(&self, sql: &str, params: &[PgBindValue]) -> Result<RowSet, CrudError> {
        self.record(sql, params).await?;
        Ok(self.rows.clone())
    }

    async fn exec(&self, sql: &str, params: &[PgBindValue]) -> Result<u64, CrudError> {
        self.record(sql, params).await?;
        Ok(self.affected)
    }

    async fn close(&self) {}
}

pub fn service_with(store: SpyStore) -> (Arc<SpyStore>, Arc<CrudService>) {
    let store = Arc::new(store);
    let service = Arc::new(CrudService::new(store.clone(), Duration::from_secs(2)));
    (store, service)
}

pub const BOOK_ID: &str = "550e8400-e29b-41d4-a716-446655440000";

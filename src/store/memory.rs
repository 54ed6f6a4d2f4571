//! In-process stores.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use super::AuditStore;
use crate::{GatewayError, Result};

/// Store used when no durable backend is configured. Accepts and drops
/// every row.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledStore;

#[async_trait]
impl AuditStore for DisabledStore {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn insert(&self, _table: &str, _record: Value) -> Result<()> {
        Ok(())
    }
}

/// Store that keeps rows in memory, for tests and local runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<(String, Value)>>,
    fail: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every write and ping fails.
    pub fn failing() -> Self {
        Self {
            rows: Mutex::default(),
            fail: true,
        }
    }

    /// Rows written so far as `(table, row)` pairs, in write order.
    pub fn records(&self) -> Vec<(String, Value)> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rows written to one table.
    pub fn table(&self, table: &str) -> Vec<Value> {
        self.records()
            .into_iter()
            .filter(|(t, _)| t == table)
            .map(|(_, row)| row)
            .collect()
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn insert(&self, table: &str, record: Value) -> Result<()> {
        if self.fail {
            return Err(GatewayError::Store(format!("memory store rejected write to {table}")));
        }
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((table.to_string(), record));
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        if self.fail {
            return Err(GatewayError::Store("memory store unavailable".into()));
        }
        Ok(())
    }
}

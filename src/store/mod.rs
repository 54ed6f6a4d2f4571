//! Durable audit trail of capability invocations.
//!
//! The store is an audit sink, not a source of truth: live analytics come
//! from the in-process [`MetricsAggregator`](crate::analytics::MetricsAggregator).
//! [`AuditLog`] wraps any [`AuditStore`] and makes every write
//! fire-and-forget. Failures are logged and counted, never returned to the
//! capability caller.

mod memory;
mod supabase;

pub use memory::{DisabledStore, MemoryStore};
pub use supabase::SupabaseStore;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::Result;
use crate::telemetry;
use crate::types::Capability;

/// Table holding one row per capability invocation.
pub const REQUESTS_TABLE: &str = "ai_requests";
/// Table holding named timing samples.
pub const PERFORMANCE_TABLE: &str = "performance_metrics";
/// Table holding one row per generated file.
pub const FILES_TABLE: &str = "generated_files";

/// A sink that can persist JSON rows into named tables.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Store name for logging/debugging.
    fn name(&self) -> &str;

    /// Insert one row into `table`.
    async fn insert(&self, table: &str, record: Value) -> Result<()>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// One row of the `ai_requests` table.
#[derive(Debug, Clone, Serialize)]
pub struct RequestRecord {
    pub id: String,
    pub request_type: Capability,
    pub capability: Capability,
    pub model: String,
    pub prompt: String,
    pub response_data: Value,
    pub execution_time: f64,
    pub success: bool,
    pub error_message: Option<String>,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
}

impl RequestRecord {
    pub fn new(
        capability: Capability,
        model: impl Into<String>,
        prompt: impl Into<String>,
        execution_time: f64,
    ) -> Self {
        Self {
            id: generate_request_id(),
            request_type: capability,
            capability,
            model: model.into(),
            prompt: prompt.into(),
            response_data: Value::Null,
            execution_time,
            success: true,
            error_message: None,
            status: "completed",
            created_at: Utc::now(),
        }
    }

    pub fn response_data(mut self, data: Value) -> Self {
        self.response_data = data;
        self
    }

    /// Mark the row as failed with the given message.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error_message = Some(error.into());
        self.status = "error";
        self
    }
}

/// One row of the `performance_metrics` table.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceRecord {
    pub metric_type: String,
    pub metric_value: f64,
    pub recorded_at: DateTime<Utc>,
}

/// One row of the `generated_files` table.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    pub filename: String,
    pub file_type: String,
    pub file_path: String,
    pub file_size: u64,
    pub created_at: DateTime<Utc>,
}

/// Random v4 UUID for the `id` column of request rows.
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Fire-and-forget front end for an [`AuditStore`].
///
/// Each `record_*` method spawns the write onto the current tokio runtime
/// and returns immediately.
#[derive(Clone)]
pub struct AuditLog {
    store: Arc<dyn AuditStore>,
}

impl AuditLog {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// An audit log that discards everything.
    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledStore))
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    pub fn record_request(&self, record: RequestRecord) {
        self.spawn_insert(REQUESTS_TABLE, &record);
    }

    pub fn record_performance_metric(&self, metric_type: impl Into<String>, value: f64) {
        let record = PerformanceRecord {
            metric_type: metric_type.into(),
            metric_value: value,
            recorded_at: Utc::now(),
        };
        self.spawn_insert(PERFORMANCE_TABLE, &record);
    }

    pub fn record_generated_file(&self, record: FileRecord) {
        self.spawn_insert(FILES_TABLE, &record);
    }

    /// Write a row and wait for it, swallowing any failure.
    ///
    /// Returns whether the write succeeded.
    pub async fn write(&self, table: &'static str, record: Value) -> bool {
        write_swallowing(self.store.as_ref(), table, record).await
    }

    fn spawn_insert<R: Serialize>(&self, table: &'static str, record: &R) {
        let record = match serde_json::to_value(record) {
            Ok(record) => record,
            Err(e) => {
                warn!(table, error = %e, "failed to serialize audit record");
                count_failure(table);
                return;
            }
        };
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            write_swallowing(store.as_ref(), table, record).await;
        });
    }
}

async fn write_swallowing(store: &dyn AuditStore, table: &'static str, record: Value) -> bool {
    match store.insert(table, record).await {
        Ok(()) => {
            debug!(store = store.name(), table, "audit record written");
            true
        }
        Err(e) => {
            warn!(store = store.name(), table, error = %e, "audit write failed");
            count_failure(table);
            false
        }
    }
}

fn count_failure(table: &'static str) {
    metrics::counter!(telemetry::STORE_FAILURES_TOTAL, "table" => table).increment(1);
}

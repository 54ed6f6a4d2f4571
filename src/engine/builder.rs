//! Builder for configuring engine instances

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use super::Engine;
use crate::analytics::MetricsAggregator;
use crate::providers::ModelClient;
use crate::store::{AuditLog, AuditStore};
use crate::types::ModelCatalog;
use crate::{GatewayError, Result};

/// Default per-call timeout for model requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default cap on concurrent outbound model calls.
pub const DEFAULT_MAX_CONCURRENT: usize = 64;

/// Builder for configuring engine instances.
pub struct EngineBuilder {
    client: Option<Arc<dyn ModelClient>>,
    metrics: Option<Arc<MetricsAggregator>>,
    audit: Option<AuditLog>,
    models: ModelCatalog,
    files_dir: Option<PathBuf>,
    timeout: Duration,
    max_concurrent: usize,
    count_workflow_subtasks: bool,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            client: None,
            metrics: None,
            audit: None,
            models: ModelCatalog::default(),
            files_dir: None,
            timeout: DEFAULT_TIMEOUT,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            count_workflow_subtasks: false,
        }
    }

    /// Model client used for every capability call. Required.
    pub fn client(mut self, client: Arc<dyn ModelClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Share an existing aggregator (e.g. with the HTTP layer or a test).
    ///
    /// A fresh one is created when unset.
    pub fn metrics(mut self, metrics: Arc<MetricsAggregator>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Durable audit store. Defaults to [`DisabledStore`](crate::store::DisabledStore).
    pub fn store(mut self, store: Arc<dyn AuditStore>) -> Self {
        self.audit = Some(AuditLog::new(store));
        self
    }

    /// Role-to-model mapping.
    pub fn models(mut self, models: ModelCatalog) -> Self {
        self.models = models;
        self
    }

    /// Directory for generated files (default: `$TMPDIR/tron_ai_files`).
    pub fn files_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.files_dir = Some(dir.into());
        self
    }

    /// Per-call timeout for model requests.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Maximum concurrent outbound model calls (at least 1).
    pub fn max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Also count each workflow task whose `type` names a capability
    /// against that capability's usage.
    pub fn count_workflow_subtasks(mut self, enabled: bool) -> Self {
        self.count_workflow_subtasks = enabled;
        self
    }

    /// Build the engine.
    pub fn build(self) -> Result<Engine> {
        let client = self.client.ok_or(GatewayError::NoClient)?;
        if self.timeout.is_zero() {
            return Err(GatewayError::Configuration(
                "request timeout must be greater than zero".into(),
            ));
        }

        Ok(Engine {
            client,
            metrics: self.metrics.unwrap_or_default(),
            audit: self.audit.unwrap_or_else(AuditLog::disabled),
            models: self.models,
            files_dir: self
                .files_dir
                .unwrap_or_else(|| std::env::temp_dir().join("tron_ai_files")),
            timeout: self.timeout,
            permits: Semaphore::new(self.max_concurrent.max(1)),
            count_workflow_subtasks: self.count_workflow_subtasks,
        })
    }
}

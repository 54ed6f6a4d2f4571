//! Point-in-time analytics views.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Capability;

/// Prefix for flattened scrape keys. Kept stable for existing dashboards.
pub const SCRAPE_PREFIX: &str = "tron_ai";

/// Overall health derived from the error counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemStatus {
    Operational,
    Degraded,
}

/// Response-time derived values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Mean of the response-time window, in seconds; 0 when empty.
    pub average_response_time: f64,
    /// Sum of the response-time window, in seconds.
    pub total_processing_time: f64,
    pub requests_per_minute: f64,
}

/// Immutable, internally consistent read of aggregator state.
///
/// Every field was copied under the same lock acquisition, so pairs such
/// as `error_count`/`total_requests` always describe the same instant.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub system_status: SystemStatus,
    pub total_requests: u64,
    pub error_count: u64,
    /// Percentage in `[0, 100]`.
    pub error_rate: f64,
    pub uptime_seconds: f64,
    pub capability_usage: BTreeMap<Capability, u64>,
    pub performance_metrics: PerformanceMetrics,
    /// Number of samples currently in the response-time window.
    pub response_time_samples: usize,
    pub started_at: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
    /// Window contents, oldest first.
    #[serde(skip)]
    pub response_times: Vec<f64>,
}

impl MetricsSnapshot {
    /// Usage count for one capability.
    pub fn usage(&self, capability: Capability) -> u64 {
        self.capability_usage.get(&capability).copied().unwrap_or(0)
    }

    /// Key-per-metric view for pull-based scraping.
    ///
    /// Keys: `tron_ai_total_requests`, `tron_ai_error_count`,
    /// `tron_ai_error_rate`, `tron_ai_average_response_time`,
    /// `tron_ai_uptime_seconds`, and `tron_ai_capability_<name>_usage` for
    /// every capability.
    pub fn flatten(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();
        metrics.insert(
            format!("{SCRAPE_PREFIX}_total_requests"),
            self.total_requests as f64,
        );
        metrics.insert(
            format!("{SCRAPE_PREFIX}_error_count"),
            self.error_count as f64,
        );
        metrics.insert(format!("{SCRAPE_PREFIX}_error_rate"), self.error_rate);
        metrics.insert(
            format!("{SCRAPE_PREFIX}_average_response_time"),
            self.performance_metrics.average_response_time,
        );
        metrics.insert(
            format!("{SCRAPE_PREFIX}_uptime_seconds"),
            self.uptime_seconds,
        );
        for (capability, count) in &self.capability_usage {
            metrics.insert(
                format!("{SCRAPE_PREFIX}_capability_{capability}_usage"),
                *count as f64,
            );
        }
        metrics
    }
}

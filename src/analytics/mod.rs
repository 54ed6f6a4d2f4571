//! Request-metrics aggregation and analytics reporting.
//!
//! [`MetricsAggregator`] is the one piece of shared mutable state touched by
//! every capability handler. Each completed (or failed) invocation calls
//! [`record`](MetricsAggregator::record) exactly once; status, analytics and
//! metrics endpoints read [`snapshot`](MetricsAggregator::snapshot).
//!
//! # Concurrency
//!
//! All counters and the response-time window live behind a single mutex.
//! The critical section is a handful of integer increments and one O(1)
//! ring-buffer push, so it is held for nanoseconds and never across an
//! `.await`. Snapshots copy everything under the same lock, which rules
//! out torn reads such as `error_count > total_requests`.
//!
//! A poisoned lock is recovered rather than propagated: a panic elsewhere
//! must not turn metrics bookkeeping into a user-visible failure.
//!
//! # Scoped recording
//!
//! ```text
//!   let guard = metrics.begin(Capability::WebResearch);
//!   let result = client.invoke(..).await;   // may time out or be cancelled
//!   guard.finish(result.is_ok());           // records once
//!   // dropping an unfinished guard records a failure
//! ```
//!
//! # Accounting model
//!
//! At-most-once: if the process dies between the remote call and the
//! record, that invocation is missing from the metrics. There is no replay.

mod snapshot;
mod window;

pub use snapshot::{MetricsSnapshot, PerformanceMetrics, SCRAPE_PREFIX, SystemStatus};
pub use window::{DEFAULT_WINDOW_CAPACITY, ResponseTimeWindow};

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::telemetry;
use crate::types::Capability;
use crate::{GatewayError, Result};

#[derive(Debug)]
struct AggregateState {
    total_requests: u64,
    error_count: u64,
    usage: [u64; Capability::COUNT],
    window: ResponseTimeWindow,
}

/// Process-wide usage counters and rolling response-time statistics.
///
/// Construct one per gateway and share it behind an `Arc`; tests build
/// isolated instances.
#[derive(Debug)]
pub struct MetricsAggregator {
    state: Mutex<AggregateState>,
    started: Instant,
    started_at: DateTime<Utc>,
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsAggregator {
    /// Create an aggregator with the default window capacity (1000).
    pub fn new() -> Self {
        Self::with_window_capacity(DEFAULT_WINDOW_CAPACITY)
    }

    /// Create an aggregator retaining `capacity` response times.
    pub fn with_window_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(AggregateState {
                total_requests: 0,
                error_count: 0,
                usage: [0; Capability::COUNT],
                window: ResponseTimeWindow::new(capacity),
            }),
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AggregateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the outcome of one capability invocation.
    pub fn record(&self, capability: Capability, duration: Duration, succeeded: bool) {
        let seconds = duration.as_secs_f64();
        {
            let mut state = self.lock();
            state.total_requests = state.total_requests.saturating_add(1);
            let slot = &mut state.usage[capability.index()];
            *slot = slot.saturating_add(1);
            state.window.push(seconds);
            if !succeeded {
                state.error_count = state.error_count.saturating_add(1);
            }
        }

        let status = if succeeded { "ok" } else { "error" };
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "capability" => capability.as_str(),
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
            "capability" => capability.as_str(),
        )
        .record(seconds);
    }

    /// Record an outcome for a capability given by name.
    ///
    /// Unknown names are rejected with [`GatewayError::UnknownCapability`]
    /// and leave every counter untouched.
    pub fn record_named(&self, capability: &str, duration: Duration, succeeded: bool) -> Result<()> {
        match capability.parse::<Capability>() {
            Ok(capability) => {
                self.record(capability, duration, succeeded);
                Ok(())
            }
            Err(e) => {
                warn!(capability, "rejecting metrics record for unknown capability");
                metrics::counter!(telemetry::UNKNOWN_CAPABILITY_TOTAL).increment(1);
                Err(e)
            }
        }
    }

    /// Record an outcome with a duration in (fractional) seconds.
    ///
    /// Negative and non-finite durations are rejected.
    pub fn record_secs(&self, capability: Capability, seconds: f64, succeeded: bool) -> Result<()> {
        let duration = Duration::try_from_secs_f64(seconds).map_err(|_| {
            GatewayError::InvalidInput(format!("invalid duration: {seconds} seconds"))
        })?;
        self.record(capability, duration, succeeded);
        Ok(())
    }

    /// Count one workflow sub-task against a capability's usage counter.
    ///
    /// Does not touch `total_requests`, the error count or the window.
    pub fn record_subtask(&self, capability: Capability) {
        let mut state = self.lock();
        let slot = &mut state.usage[capability.index()];
        *slot = slot.saturating_add(1);
    }

    /// Start timing an invocation; see [`InvocationGuard`].
    pub fn begin(&self, capability: Capability) -> InvocationGuard<'_> {
        InvocationGuard {
            aggregator: self,
            capability,
            started: Instant::now(),
            finished: false,
        }
    }

    /// Wall-clock time the aggregator was created.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Take a consistent snapshot and derive the reporting values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let (total_requests, error_count, usage, response_times, sum) = {
            let state = self.lock();
            (
                state.total_requests,
                state.error_count,
                state.usage,
                state.window.to_vec(),
                state.window.sum(),
            )
        };
        let uptime = self.started.elapsed().as_secs_f64();

        let average_response_time = if response_times.is_empty() {
            0.0
        } else {
            sum / response_times.len() as f64
        };
        let requests_per_minute = total_requests as f64 / (uptime / 60.0).max(1.0);
        let error_rate = (error_count as f64 / total_requests.max(1) as f64 * 100.0).min(100.0);
        let system_status = if error_count == 0 {
            SystemStatus::Operational
        } else {
            SystemStatus::Degraded
        };

        MetricsSnapshot {
            system_status,
            total_requests,
            error_count,
            error_rate,
            uptime_seconds: uptime,
            capability_usage: Capability::ALL
                .into_iter()
                .map(|c| (c, usage[c.index()]))
                .collect(),
            performance_metrics: PerformanceMetrics {
                average_response_time,
                total_processing_time: sum,
                requests_per_minute,
            },
            response_time_samples: response_times.len(),
            started_at: self.started_at,
            timestamp: Utc::now(),
            response_times,
        }
    }
}

/// Records exactly one outcome for an in-flight invocation.
///
/// Call [`finish`](Self::finish) with the result. If the guard is dropped
/// first (the owning future was cancelled, timed out, or panicked) a
/// failure is recorded with the elapsed time.
#[must_use = "dropping the guard immediately records a failure"]
pub struct InvocationGuard<'a> {
    aggregator: &'a MetricsAggregator,
    capability: Capability,
    started: Instant,
    finished: bool,
}

impl InvocationGuard<'_> {
    /// Record the outcome and return the measured duration.
    pub fn finish(mut self, succeeded: bool) -> Duration {
        let elapsed = self.started.elapsed();
        self.finished = true;
        self.aggregator.record(self.capability, elapsed, succeeded);
        elapsed
    }
}

impl Drop for InvocationGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                capability = %self.capability,
                "invocation ended without an outcome; recording failure"
            );
            self.aggregator
                .record(self.capability, self.started.elapsed(), false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_updates_counters() {
        let metrics = MetricsAggregator::new();
        metrics.record(Capability::ImageCreation, Duration::from_secs(1), true);
        metrics.record(Capability::ImageCreation, Duration::from_secs(2), false);
        metrics.record(Capability::WebResearch, Duration::from_secs(3), true);

        let snap = metrics.snapshot();
        assert_eq!(snap.total_requests, 3);
        assert_eq!(snap.error_count, 1);
        assert_eq!(snap.usage(Capability::ImageCreation), 2);
        assert_eq!(snap.usage(Capability::WebResearch), 1);
        assert_eq!(snap.performance_metrics.average_response_time, 2.0);
        assert_eq!(snap.performance_metrics.total_processing_time, 6.0);
        assert_eq!(snap.system_status, SystemStatus::Degraded);
    }

    #[test]
    fn fresh_aggregator_is_operational_with_zero_rates() {
        let snap = MetricsAggregator::new().snapshot();
        assert_eq!(snap.total_requests, 0);
        assert_eq!(snap.error_rate, 0.0);
        assert_eq!(snap.performance_metrics.average_response_time, 0.0);
        assert_eq!(snap.performance_metrics.requests_per_minute, 0.0);
        assert_eq!(snap.system_status, SystemStatus::Operational);
        assert_eq!(snap.capability_usage.len(), Capability::COUNT);
    }

    #[test]
    fn record_named_rejects_unknown_without_side_effects() {
        let metrics = MetricsAggregator::new();
        let err = metrics
            .record_named("not_a_real_capability", Duration::from_secs(1), true)
            .unwrap_err();
        assert!(matches!(err, GatewayError::UnknownCapability(_)));

        let snap = metrics.snapshot();
        assert_eq!(snap.total_requests, 0);
        assert_eq!(snap.capability_usage.len(), Capability::COUNT);
        assert!(snap.capability_usage.values().all(|v| *v == 0));
    }

    #[test]
    fn record_named_accepts_known() {
        let metrics = MetricsAggregator::new();
        metrics
            .record_named("code_execution", Duration::from_millis(10), true)
            .unwrap();
        assert_eq!(metrics.snapshot().usage(Capability::CodeExecution), 1);
    }

    #[test]
    fn record_secs_rejects_negative_and_nan() {
        let metrics = MetricsAggregator::new();
        assert!(metrics.record_secs(Capability::TextGeneration, -1.0, true).is_err());
        assert!(metrics.record_secs(Capability::TextGeneration, f64::NAN, true).is_err());
        assert!(metrics.record_secs(Capability::TextGeneration, 0.25, true).is_ok());
        assert_eq!(metrics.snapshot().total_requests, 1);
    }

    #[test]
    fn subtask_counts_usage_only() {
        let metrics = MetricsAggregator::new();
        metrics.record_subtask(Capability::WebResearch);
        let snap = metrics.snapshot();
        assert_eq!(snap.usage(Capability::WebResearch), 1);
        assert_eq!(snap.total_requests, 0);
        assert_eq!(snap.response_time_samples, 0);
    }

    #[test]
    fn guard_finish_records_once() {
        let metrics = MetricsAggregator::new();
        let guard = metrics.begin(Capability::BrowserControl);
        guard.finish(true);
        let snap = metrics.snapshot();
        assert_eq!(snap.total_requests, 1);
        assert_eq!(snap.error_count, 0);
    }

    #[test]
    fn dropped_guard_records_failure() {
        let metrics = MetricsAggregator::new();
        {
            let _guard = metrics.begin(Capability::LiveInteractions);
        }
        let snap = metrics.snapshot();
        assert_eq!(snap.total_requests, 1);
        assert_eq!(snap.error_count, 1);
        assert_eq!(snap.usage(Capability::LiveInteractions), 1);
    }

    #[test]
    fn error_rate_is_percentage() {
        let metrics = MetricsAggregator::new();
        for i in 0..4 {
            metrics.record(Capability::TextGeneration, Duration::ZERO, i != 0);
        }
        assert_eq!(metrics.snapshot().error_rate, 25.0);
    }

    #[test]
    fn flatten_has_key_per_capability() {
        let metrics = MetricsAggregator::new();
        metrics.record(Capability::FileCreation, Duration::from_secs(1), true);
        let flat = metrics.snapshot().flatten();
        assert_eq!(flat["tron_ai_total_requests"], 1.0);
        assert_eq!(flat["tron_ai_capability_file_creation_usage"], 1.0);
        assert_eq!(flat["tron_ai_capability_web_research_usage"], 0.0);
        assert_eq!(flat.len(), 5 + Capability::COUNT);
    }
}

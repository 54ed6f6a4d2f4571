//! Telemetry metric name constants.
//!
//! Centralised metric names for gateway operations. The in-process
//! [`MetricsAggregator`](crate::analytics::MetricsAggregator) answers the
//! JSON analytics endpoints; these names feed whatever `metrics` recorder
//! the host installs (e.g. prometheus, statsd). Without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `tron_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `capability`: capability invoked (e.g. "image_creation")
//! - `status`: outcome: "ok" or "error"
//! - `operation`: model client operation (e.g. "invoke")
//! - `table`: audit store table name

/// Total capability invocations recorded by the aggregator.
///
/// Labels: `capability`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "tron_requests_total";

/// Capability invocation duration in seconds.
///
/// Labels: `capability`.
pub const REQUEST_DURATION_SECONDS: &str = "tron_request_duration_seconds";

/// Total retry attempts against the model API (not counting the initial request).
///
/// Labels: `operation`.
pub const RETRIES_TOTAL: &str = "tron_retries_total";

/// Total audit store writes that failed and were swallowed.
///
/// Labels: `table`.
pub const STORE_FAILURES_TOTAL: &str = "tron_store_failures_total";

/// Total `record` calls rejected for naming an unknown capability.
pub const UNKNOWN_CAPABILITY_TOTAL: &str = "tron_unknown_capability_total";

//! tron-gateway - HTTP gateway for generative-AI capabilities
//!
//! This crate exposes a fixed set of AI-backed capabilities (text, images,
//! web research, code analysis, browser control, file creation, live
//! interaction, workflows) behind one [`Engine`], and keeps process-wide
//! usage analytics in a shared [`MetricsAggregator`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tron_gateway::{Engine, GeminiClient, MetricsAggregator};
//!
//! #[tokio::main]
//! async fn main() -> tron_gateway::Result<()> {
//!     let metrics = Arc::new(MetricsAggregator::new());
//!     let engine = Engine::builder()
//!         .client(Arc::new(GeminiClient::new("your-gemini-key")?))
//!         .metrics(metrics.clone())
//!         .build()?;
//!
//!     let outcome = engine.research_web("Rust 2024 edition changes", None).await;
//!     println!("{}", serde_json::to_string_pretty(&outcome)?);
//!
//!     let snapshot = metrics.snapshot();
//!     println!("{} requests, {:.1}% errors", snapshot.total_requests, snapshot.error_rate);
//!     Ok(())
//! }
//! ```
//!
//! # Recording without the engine
//!
//! The aggregator can be fed directly:
//!
//! ```rust
//! use std::time::Duration;
//! use tron_gateway::{Capability, MetricsAggregator};
//!
//! let metrics = MetricsAggregator::new();
//! metrics.record(Capability::ImageCreation, Duration::from_millis(1200), true);
//! assert_eq!(metrics.snapshot().usage(Capability::ImageCreation), 1);
//! ```

pub mod analytics;
pub mod engine;
pub mod error;
pub mod providers;
#[cfg(feature = "server")]
pub mod server;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use analytics::{InvocationGuard, MetricsAggregator, MetricsSnapshot, SystemStatus};
pub use engine::{Engine, EngineBuilder, SystemAnalytics};
pub use error::{GatewayError, Result};
pub use providers::{GeminiClient, ModelClient, RetryConfig, RetryingModelClient};
pub use store::{AuditLog, AuditStore};
pub use version::{BuildInfo, PKG_VERSION, build_info, version_string};

// Re-export all types
pub use types::{
    Capability, CapabilityOutcome, InvokeOptions, ModelCatalog, ModelResponse, ModelRole,
};

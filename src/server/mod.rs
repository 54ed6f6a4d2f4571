//! HTTP server and daemon configuration.
//!
//! This module provides:
//! - The axum router and handlers (`routes`)
//! - The JSON error envelope (`error`)
//! - Configuration and secrets loading (`config`)

pub mod config;
mod error;
mod routes;

pub use error::ApiError;
pub use routes::{API_PREFIX, AppState, router};

//! Model client implementations.
//!
//! [`ModelClient`] is the seam between capability handlers and the remote
//! generative-AI API. [`GeminiClient`] talks to the real service;
//! [`RetryingModelClient`] adds backoff on transient failures around any
//! client.

pub mod gemini;
pub mod retry;
pub mod traits;

pub use gemini::GeminiClient;
pub use retry::{RetryConfig, RetrySettings, RetryingModelClient};
pub use traits::ModelClient;

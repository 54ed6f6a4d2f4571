//! Model client trait.
//!
//! The generative-AI API is an opaque, slow, fallible collaborator. The
//! engine talks to it only through [`ModelClient`], which makes the
//! transport swappable (Gemini REST in production, mocks in tests) and
//! lets decorators such as [`RetryingModelClient`](super::RetryingModelClient)
//! wrap any implementation.
//!
//! # Example
//!
//! ```ignore
//! async fn invoke(&self, model: &str, prompt: &str, options: &InvokeOptions) -> Result<ModelResponse> {
//!     if prompt.is_empty() {
//!         return Err(GatewayError::InvalidInput("empty prompt".into()));
//!     }
//!     // ... call the API
//! }
//! ```

use async_trait::async_trait;

use crate::Result;
use crate::types::{InvokeOptions, ModelResponse};

/// A remote model capable of answering a single prompt.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Client name for logging/debugging.
    fn name(&self) -> &str;

    /// Send one prompt to `model` and return its response.
    ///
    /// Implementations map transport and API failures onto
    /// [`GatewayError`](crate::GatewayError) variants so the retry
    /// decorator can tell transient errors from permanent ones.
    async fn invoke(
        &self,
        model: &str,
        prompt: &str,
        options: &InvokeOptions,
    ) -> Result<ModelResponse>;
}

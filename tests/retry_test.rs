//! Tests for the retry decorator around model clients.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use tron_gateway::{
    GatewayError, InvokeOptions, ModelClient, ModelResponse, Result, RetryConfig,
    RetryingModelClient,
};

// ============================================================================
// Mock client
// ============================================================================

/// Mock model client that fails N times then succeeds.
struct FailThenSucceed {
    fail_count: AtomicU32,
    fail_with: fn() -> GatewayError,
    total_calls: AtomicU32,
}

impl FailThenSucceed {
    fn new(failures: u32, fail_with: fn() -> GatewayError) -> Self {
        Self {
            fail_count: AtomicU32::new(failures),
            fail_with,
            total_calls: AtomicU32::new(0),
        }
    }

    fn call_count(&self) -> u32 {
        self.total_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ModelClient for FailThenSucceed {
    fn name(&self) -> &str {
        "fail-then-succeed"
    }

    async fn invoke(
        &self,
        model: &str,
        _prompt: &str,
        _options: &InvokeOptions,
    ) -> Result<ModelResponse> {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        let remaining = self.fail_count.load(Ordering::Relaxed);
        if remaining > 0 {
            self.fail_count.fetch_sub(1, Ordering::Relaxed);
            return Err((self.fail_with)());
        }
        Ok(ModelResponse::text(format!("answer from {model}")))
    }
}

fn fast_retries(attempts: u32) -> RetryConfig {
    RetryConfig::new()
        .max_attempts(attempts)
        .initial_delay(Duration::from_millis(1))
        .jitter(false)
}

async fn invoke(client: &RetryingModelClient) -> Result<ModelResponse> {
    client
        .invoke("gemini-test", "hello", &InvokeOptions::default())
        .await
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn retries_transient_then_succeeds() {
    let inner = Arc::new(FailThenSucceed::new(2, || GatewayError::Api {
        status: 503,
        message: "overloaded".into(),
    }));
    let client = RetryingModelClient::new(inner.clone(), fast_retries(3));

    let response = invoke(&client).await.unwrap();

    assert_eq!(response.text.as_deref(), Some("answer from gemini-test"));
    assert_eq!(inner.call_count(), 3); // 2 failures + 1 success
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let inner = Arc::new(FailThenSucceed::new(10, || {
        GatewayError::Http("connection reset".into())
    }));
    let client = RetryingModelClient::new(inner.clone(), fast_retries(3));

    let err = invoke(&client).await.unwrap_err();

    assert!(matches!(err, GatewayError::Http(_)));
    assert_eq!(inner.call_count(), 3);
}

#[tokio::test]
async fn does_not_retry_permanent_errors() {
    let inner = Arc::new(FailThenSucceed::new(1, || GatewayError::AuthenticationFailed));
    let client = RetryingModelClient::new(inner.clone(), fast_retries(5));

    let err = invoke(&client).await.unwrap_err();

    assert!(matches!(err, GatewayError::AuthenticationFailed));
    assert_eq!(inner.call_count(), 1); // no retry
}

#[tokio::test]
async fn content_filter_is_not_retried() {
    let inner = Arc::new(FailThenSucceed::new(1, || GatewayError::ContentFiltered {
        reason: "SAFETY".into(),
    }));
    let client = RetryingModelClient::new(inner.clone(), fast_retries(3));

    assert!(invoke(&client).await.is_err());
    assert_eq!(inner.call_count(), 1);
}

#[tokio::test]
async fn respects_retry_after_duration() {
    let inner = Arc::new(FailThenSucceed::new(1, || GatewayError::RateLimited {
        retry_after: Some(Duration::from_millis(50)),
    }));
    let client = RetryingModelClient::new(inner.clone(), fast_retries(2));

    let start = std::time::Instant::now();
    let result = invoke(&client).await;
    let elapsed = start.elapsed();

    assert!(result.is_ok());
    // waited for the hint, not the 1ms backoff
    assert!(elapsed >= Duration::from_millis(40));
}

#[tokio::test]
async fn disabled_config_no_retry() {
    let inner = Arc::new(FailThenSucceed::new(1, || GatewayError::RateLimited {
        retry_after: None,
    }));
    let client = RetryingModelClient::new(inner.clone(), RetryConfig::disabled());

    assert!(invoke(&client).await.is_err());
    assert_eq!(inner.call_count(), 1);
}

#[tokio::test]
async fn name_is_forwarded() {
    let inner = Arc::new(FailThenSucceed::new(0, || GatewayError::EmptyResponse));
    let client = RetryingModelClient::new(inner, RetryConfig::disabled());
    assert_eq!(client.name(), "fail-then-succeed");
}

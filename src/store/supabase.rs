//! Supabase (PostgREST) audit store.
//!
//! Rows are POSTed to `{url}/rest/v1/{table}`.
//! See: <https://postgrest.org/en/stable/references/api/tables_views.html>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use super::AuditStore;
use crate::{GatewayError, Result};

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Audit store backed by a Supabase project's REST API.
#[derive(Clone)]
pub struct SupabaseStore {
    url: String,
    service_key: String,
    schema: Option<String>,
    http: Client,
}

impl SupabaseStore {
    /// Create a store for the project at `url`, authenticating with the
    /// service-role key.
    pub fn new(url: impl Into<String>, service_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            schema: None,
            http,
        })
    }

    /// Write to a non-default Postgres schema.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }

    async fn check_status(response: reqwest::Response, table: &str) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::Store(format!(
            "{table}: HTTP {}: {body}",
            status.as_u16()
        )))
    }
}

#[async_trait]
impl AuditStore for SupabaseStore {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn insert(&self, table: &str, record: Value) -> Result<()> {
        let url = format!("{}/rest/v1/{}", self.url, table);
        let mut request = self
            .authorize(self.http.post(&url))
            .header("Prefer", "return=minimal")
            .json(&record);
        if let Some(schema) = &self.schema {
            request = request.header("Content-Profile", schema);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Store(e.to_string()))?;
        Self::check_status(response, table).await
    }

    async fn ping(&self) -> Result<()> {
        let url = format!("{}/rest/v1/", self.url);
        let mut request = self.authorize(self.http.get(&url));
        if let Some(schema) = &self.schema {
            request = request.header("Accept-Profile", schema);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Store(e.to_string()))?;
        Self::check_status(response, "ping").await
    }
}

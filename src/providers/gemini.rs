//! Gemini REST client.
//!
//! Calls the `models/{model}:generateContent` endpoint of the Generative
//! Language API. See: <https://ai.google.dev/api/generate-content>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use super::traits::ModelClient;
use crate::types::{InlineImage, InvokeOptions, ModelResponse, ModelTool};
use crate::{GatewayError, Result};

/// Default base URL for the Generative Language API
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default HTTP timeout for a single request.
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for the Gemini `generateContent` API.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl GeminiClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Generate content for a single prompt.
    pub async fn generate_content(
        &self,
        model: &str,
        prompt: &str,
        options: &InvokeOptions,
    ) -> Result<ModelResponse> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        let body = build_request(prompt, options);

        debug!(model, "sending generateContent request");
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let response = Self::handle_response_errors(response, model).await?;
        let raw: Value = response.json().await?;
        parse_response(raw)
    }

    /// Check response status and map to appropriate error.
    async fn handle_response_errors(
        response: reqwest::Response,
        model: &str,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or(body);

        match status.as_u16() {
            401 | 403 => Err(GatewayError::AuthenticationFailed),
            404 => Err(GatewayError::ModelNotFound(model.to_string())),
            429 => Err(GatewayError::RateLimited { retry_after }),
            code => Err(GatewayError::Api {
                status: code,
                message: format!("Gemini API error: {message}"),
            }),
        }
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn invoke(
        &self,
        model: &str,
        prompt: &str,
        options: &InvokeOptions,
    ) -> Result<ModelResponse> {
        self.generate_content(model, prompt, options).await
    }
}

// ============================================================================
// Wire format
// ============================================================================

/// Build the `generateContent` request body.
fn build_request(prompt: &str, options: &InvokeOptions) -> Value {
    let mut generation_config = Map::new();
    if let Some(t) = options.temperature {
        generation_config.insert("temperature".into(), json!(t));
    }
    if let Some(p) = options.top_p {
        generation_config.insert("topP".into(), json!(p));
    }
    if let Some(k) = options.top_k {
        generation_config.insert("topK".into(), json!(k));
    }
    if !options.response_modalities.is_empty() {
        generation_config.insert(
            "responseModalities".into(),
            json!(options.response_modalities),
        );
    }
    for (key, value) in &options.extra {
        generation_config.insert(key.clone(), value.clone());
    }

    let mut body = json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }],
        }],
    });
    if !generation_config.is_empty() {
        body["generationConfig"] = Value::Object(generation_config);
    }
    if let Some(system) = &options.system {
        body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
    }
    if !options.tools.is_empty() {
        let tools: Vec<Value> = options
            .tools
            .iter()
            .map(|tool| match tool {
                ModelTool::GoogleSearch => json!({ "googleSearch": {} }),
            })
            .collect();
        body["tools"] = Value::Array(tools);
    }
    if !options.safety_settings.is_empty() {
        body["safetySettings"] = json!(options.safety_settings);
    }
    body
}

/// Extract text and inline data parts from a `generateContent` response.
fn parse_response(raw: Value) -> Result<ModelResponse> {
    let parsed: GenerateContentResponse = serde_json::from_value(raw.clone())?;

    if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GatewayError::ContentFiltered { reason });
    }

    let candidate = parsed
        .candidates
        .into_iter()
        .next()
        .ok_or(GatewayError::EmptyResponse)?;

    let mut texts = Vec::new();
    let mut images = Vec::new();
    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if let Some(text) = part.text {
            texts.push(text);
        }
        if let Some(data) = part.inline_data {
            images.push(InlineImage {
                mime_type: data.mime_type,
                data: data.data,
            });
        }
    }

    if texts.is_empty() && images.is_empty() {
        return match candidate.finish_reason.as_deref() {
            Some("SAFETY") | Some("PROHIBITED_CONTENT") | Some("BLOCKLIST") => {
                Err(GatewayError::ContentFiltered {
                    reason: candidate.finish_reason.unwrap_or_default(),
                })
            }
            _ => Err(GatewayError::EmptyResponse),
        };
    }

    Ok(ModelResponse {
        text: (!texts.is_empty()).then(|| texts.concat()),
        images,
        raw,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

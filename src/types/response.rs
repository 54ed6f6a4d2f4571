//! Model response types

use serde::{Deserialize, Serialize};

/// Response from a single model invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Concatenated text parts, if the model returned any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Inline binary parts (generated images, audio).
    #[serde(default)]
    pub images: Vec<InlineImage>,
    /// Untouched provider payload.
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl ModelResponse {
    /// Text response only.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

/// Base64-encoded inline data returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

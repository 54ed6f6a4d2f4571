//! Capability request bodies.
//!
//! Field names match the JSON accepted by the HTTP layer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRequest {
    pub prompt: String,
    #[serde(default)]
    pub system: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    /// Extra generation config merged over the defaults.
    #[serde(default)]
    pub config: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub query: String,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeRequest {
    pub code: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub context: Option<String>,
}

fn default_language() -> String {
    "python".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserRequest {
    pub task_description: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRequest {
    pub content: String,
    /// File name without extension.
    pub filename: String,
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "txt".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveRequest {
    /// `audio`, `video` or `text`.
    pub interaction_type: String,
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRequest {
    pub workflow_description: String,
    /// Free-form task objects; a `type` key naming a capability is
    /// recognised for sub-task accounting.
    pub tasks: Vec<Map<String, Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_request_defaults_to_python() {
        let req: CodeRequest = serde_json::from_str(r#"{"code": "print(1)"}"#).unwrap();
        assert_eq!(req.language, "python");
        assert!(req.context.is_none());
    }

    #[test]
    fn file_request_defaults_to_txt() {
        let req: FileRequest =
            serde_json::from_str(r#"{"content": "hi", "filename": "notes"}"#).unwrap();
        assert_eq!(req.format, "txt");
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let result = serde_json::from_str::<ImageRequest>(r#"{"config": {}}"#);
        assert!(result.is_err());
    }
}

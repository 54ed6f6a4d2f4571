//! Model roles and the role-to-model catalog.
//!
//! Capabilities do not name models directly; they name a [`ModelRole`],
//! and the [`ModelCatalog`] maps each role to a concrete model identifier.
//! Overrides come from the `[models]` config section.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The job a model performs for the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelRole {
    Text,
    ImageGen,
    WebResearch,
    CodeExec,
    ComputerUse,
    LiveAudio,
    Thinking,
    Vision,
}

impl ModelRole {
    pub const ALL: [ModelRole; 8] = [
        ModelRole::Text,
        ModelRole::ImageGen,
        ModelRole::WebResearch,
        ModelRole::CodeExec,
        ModelRole::ComputerUse,
        ModelRole::LiveAudio,
        ModelRole::Thinking,
        ModelRole::Vision,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelRole::Text => "text",
            ModelRole::ImageGen => "image_gen",
            ModelRole::WebResearch => "web_research",
            ModelRole::CodeExec => "code_exec",
            ModelRole::ComputerUse => "computer_use",
            ModelRole::LiveAudio => "live_audio",
            ModelRole::Thinking => "thinking",
            ModelRole::Vision => "vision",
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            ModelRole::Text | ModelRole::CodeExec | ModelRole::Vision => "gemini-2.5-flash",
            ModelRole::ImageGen => "gemini-2.5-flash-image",
            ModelRole::WebResearch => "gemini-2.5-pro",
            ModelRole::ComputerUse => "gemini-2.5-computer-use-preview",
            ModelRole::LiveAudio => "gemini-2.5-flash-native-audio-preview",
            ModelRole::Thinking => "gemini-2.5-pro-thinking",
        }
    }
}

/// Role-to-model mapping.
///
/// Deserializes from a table of optional overrides; any role left out
/// keeps its default model.
///
/// ```rust
/// # use tron_gateway::types::{ModelCatalog, ModelRole};
/// let catalog: ModelCatalog = serde_json::from_str(r#"{"thinking": "gemini-2.5-pro"}"#).unwrap();
/// assert_eq!(catalog.get(ModelRole::Thinking), "gemini-2.5-pro");
/// assert_eq!(catalog.get(ModelRole::ImageGen), "gemini-2.5-flash-image");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<ModelRole, String>")]
pub struct ModelCatalog {
    models: BTreeMap<ModelRole, String>,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self {
            models: ModelRole::ALL
                .into_iter()
                .map(|role| (role, role.default_model().to_string()))
                .collect(),
        }
    }
}

impl From<BTreeMap<ModelRole, String>> for ModelCatalog {
    fn from(overrides: BTreeMap<ModelRole, String>) -> Self {
        let mut catalog = Self::default();
        catalog.models.extend(overrides);
        catalog
    }
}

impl ModelCatalog {
    /// Override the model for one role.
    pub fn with(mut self, role: ModelRole, model: impl Into<String>) -> Self {
        self.models.insert(role, model.into());
        self
    }

    /// Model identifier for a role.
    pub fn get(&self, role: ModelRole) -> &str {
        self.models
            .get(&role)
            .map(String::as_str)
            .unwrap_or_else(|| role.default_model())
    }

    /// `(role name, model id)` pairs in role order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.models
            .iter()
            .map(|(role, model)| (role.as_str(), model.as_str()))
    }

    /// Number of configured roles.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Distinct model identifiers, sorted.
    pub fn distinct_models(&self) -> Vec<&str> {
        let mut models: Vec<&str> = self.models.values().map(String::as_str).collect();
        models.sort_unstable();
        models.dedup();
        models
    }
}

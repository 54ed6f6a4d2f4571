//! The fixed set of capabilities tracked by the gateway.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::model::ModelRole;
use crate::GatewayError;

/// One named category of AI-backed operation, tracked independently in
/// usage statistics.
///
/// The set is closed: analytics consumers rely on every key being present
/// from process start, so unknown names are rejected rather than added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    TextGeneration,
    ImageCreation,
    WebResearch,
    CodeExecution,
    BrowserControl,
    FileCreation,
    LiveInteractions,
    AnalyticsMonitoring,
    WorkflowAutomation,
}

impl Capability {
    /// Number of capabilities.
    pub const COUNT: usize = 9;

    /// Every capability, in reporting order.
    pub const ALL: [Capability; Self::COUNT] = [
        Capability::TextGeneration,
        Capability::ImageCreation,
        Capability::WebResearch,
        Capability::CodeExecution,
        Capability::BrowserControl,
        Capability::FileCreation,
        Capability::LiveInteractions,
        Capability::AnalyticsMonitoring,
        Capability::WorkflowAutomation,
    ];

    /// Wire name, as used in JSON keys and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::TextGeneration => "text_generation",
            Capability::ImageCreation => "image_creation",
            Capability::WebResearch => "web_research",
            Capability::CodeExecution => "code_execution",
            Capability::BrowserControl => "browser_control",
            Capability::FileCreation => "file_creation",
            Capability::LiveInteractions => "live_interactions",
            Capability::AnalyticsMonitoring => "analytics_monitoring",
            Capability::WorkflowAutomation => "workflow_automation",
        }
    }

    /// Position in [`Capability::ALL`]; used to index fixed counter arrays.
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Static description of this capability.
    pub fn descriptor(self) -> CapabilityDescriptor {
        let (description, model, features): (&str, Option<ModelRole>, &[&str]) = match self {
            Capability::TextGeneration => (
                "Advanced text generation and analysis",
                Some(ModelRole::Text),
                &["Chat", "Writing", "Analysis", "Summarization"],
            ),
            Capability::ImageCreation => (
                "Professional image generation",
                Some(ModelRole::ImageGen),
                &["Text-to-Image", "Style Control", "Quality Optimization"],
            ),
            Capability::WebResearch => (
                "Real-time web research with Google Search grounding",
                Some(ModelRole::WebResearch),
                &["Live Search", "Source Verification", "Context Analysis"],
            ),
            Capability::CodeExecution => (
                "Code execution and analysis",
                Some(ModelRole::CodeExec),
                &["Multi-language Support", "Debugging", "Optimization"],
            ),
            Capability::BrowserControl => (
                "Browser automation and web interaction",
                Some(ModelRole::ComputerUse),
                &["Clicking", "Form Filling", "Navigation", "Scraping"],
            ),
            Capability::FileCreation => (
                "File creation in any format with downloads",
                Some(ModelRole::Text),
                &["Multiple Formats", "Auto-download", "Temp Storage"],
            ),
            Capability::LiveInteractions => (
                "Real-time voice and video interactions",
                Some(ModelRole::LiveAudio),
                &["Voice Chat", "Video Streaming", "Real-time Response"],
            ),
            Capability::AnalyticsMonitoring => (
                "Advanced system analytics and monitoring",
                None,
                &["Performance Tracking", "Usage Analytics", "System Health"],
            ),
            Capability::WorkflowAutomation => (
                "Multi-task workflow coordination",
                Some(ModelRole::Thinking),
                &["Task Chaining", "Progress Tracking", "Result Aggregation"],
            ),
        };
        CapabilityDescriptor {
            capability: self,
            description,
            model,
            features,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| GatewayError::UnknownCapability(s.to_string()))
    }
}

/// Static description of a capability, reported by the capabilities endpoint.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityDescriptor {
    pub capability: Capability,
    pub description: &'static str,
    /// Model role backing the capability; `None` for internal capabilities.
    pub model: Option<ModelRole>,
    pub features: &'static [&'static str],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_position_in_all() {
        for (i, cap) in Capability::ALL.iter().enumerate() {
            assert_eq!(cap.index(), i);
        }
    }

    #[test]
    fn parse_round_trips_wire_names() {
        for cap in Capability::ALL {
            assert_eq!(cap.as_str().parse::<Capability>().unwrap(), cap);
        }
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = "not_a_real_capability".parse::<Capability>().unwrap_err();
        assert!(matches!(err, GatewayError::UnknownCapability(name) if name == "not_a_real_capability"));
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Capability::WorkflowAutomation).unwrap();
        assert_eq!(json, "\"workflow_automation\"");
    }

    #[test]
    fn analytics_is_internal() {
        assert!(Capability::AnalyticsMonitoring.descriptor().model.is_none());
        assert_eq!(
            Capability::ImageCreation.descriptor().model,
            Some(ModelRole::ImageGen)
        );
    }
}

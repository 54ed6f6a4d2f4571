//! Capability results.
//!
//! Every capability handler returns a [`CapabilityOutcome`] instead of an
//! error: failures of the remote call are part of the normal result, and
//! serialize as `{"success": false, "error": ...}` alongside an echo of the
//! request fields the caller will want to correlate.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::capability::Capability;
use super::response::InlineImage;

/// Success or failure of one capability invocation.
#[derive(Debug, Clone)]
pub enum CapabilityOutcome<T> {
    Success(Completed<T>),
    Failure(Failed),
}

/// Successful invocation.
#[derive(Debug, Clone, Serialize)]
pub struct Completed<T> {
    #[serde(flatten)]
    pub data: T,
    pub capability: Capability,
    pub model: String,
    /// Seconds spent in the handler, including the model call.
    pub processing_time: f64,
    pub timestamp: DateTime<Utc>,
}

/// Failed invocation.
#[derive(Debug, Clone, Serialize)]
pub struct Failed {
    pub capability: Capability,
    pub error: String,
    #[serde(flatten)]
    pub echo: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl<T> CapabilityOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, CapabilityOutcome::Success(_))
    }

    pub fn capability(&self) -> Capability {
        match self {
            CapabilityOutcome::Success(c) => c.capability,
            CapabilityOutcome::Failure(f) => f.capability,
        }
    }

    /// Payload of a successful invocation.
    pub fn data(&self) -> Option<&T> {
        match self {
            CapabilityOutcome::Success(c) => Some(&c.data),
            CapabilityOutcome::Failure(_) => None,
        }
    }

    /// Error description of a failed invocation.
    pub fn error(&self) -> Option<&str> {
        match self {
            CapabilityOutcome::Success(_) => None,
            CapabilityOutcome::Failure(f) => Some(&f.error),
        }
    }
}

impl<T: Serialize> Serialize for CapabilityOutcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Tagged<'a, B> {
            success: bool,
            #[serde(flatten)]
            body: &'a B,
        }

        match self {
            CapabilityOutcome::Success(body) => Tagged {
                success: true,
                body,
            }
            .serialize(serializer),
            CapabilityOutcome::Failure(body) => Tagged {
                success: false,
                body,
            }
            .serialize(serializer),
        }
    }
}

// ============================================================================
// Per-capability payloads
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct TextResult {
    pub prompt: String,
    pub response: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageResult {
    pub prompt: String,
    pub images: Vec<InlineImage>,
    /// Any caption text returned next to the images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResearchResult {
    pub query: String,
    pub results: String,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CodeResult {
    pub code: String,
    pub language: String,
    pub results: String,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrowserResult {
    pub task: String,
    pub url: Option<String>,
    pub actions: Vec<Value>,
    pub results: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub filename: String,
    pub format: String,
    pub file_path: String,
    pub download_url: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LiveResult {
    pub interaction_type: String,
    pub response: String,
    pub data: Map<String, Value>,
    /// Base64 media parts; audio replies arrive here rather than in `response`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inline_data: Vec<InlineImage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResult {
    pub workflow: String,
    pub tasks: Vec<Map<String, Value>>,
    pub results: String,
    pub task_count: usize,
}

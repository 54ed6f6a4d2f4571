//! Public types for the gateway API.

mod capability;
mod model;
mod options;
mod outcome;
mod request;
mod response;

pub use capability::{Capability, CapabilityDescriptor};
pub use model::{ModelCatalog, ModelRole};
pub use options::{InvokeOptions, Modality, ModelTool, SafetySetting};
pub use outcome::{
    BrowserResult, CapabilityOutcome, CodeResult, Completed, Failed, FileResult, ImageResult,
    LiveResult, ResearchResult, TextResult, WorkflowResult,
};
pub use request::{
    BrowserRequest, CodeRequest, FileRequest, ImageRequest, LiveRequest, ResearchRequest,
    TextRequest, WorkflowRequest,
};
pub use response::{InlineImage, ModelResponse};

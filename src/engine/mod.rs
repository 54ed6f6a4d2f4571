//! Capability handlers.
//!
//! [`Engine`] owns the model client, the role-to-model catalog and a
//! shared [`MetricsAggregator`]. Every model-backed handler follows the
//! same path:
//!
//! 1. wait for a concurrency permit
//! 2. start an [`InvocationGuard`](crate::analytics::InvocationGuard)
//! 3. call the model under the configured timeout
//! 4. finish the guard, which records the outcome exactly once
//! 5. spawn the audit write and return a [`CapabilityOutcome`]
//!
//! Handlers never return `Err`: remote failures become
//! [`CapabilityOutcome::Failure`].

mod builder;
pub mod files;
mod prompts;

pub use builder::{DEFAULT_MAX_CONCURRENT, DEFAULT_TIMEOUT, EngineBuilder};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use crate::analytics::{MetricsAggregator, MetricsSnapshot};
use crate::providers::ModelClient;
use crate::store::{AuditLog, FileRecord, RequestRecord};
use crate::types::{
    BrowserResult, Capability, CapabilityOutcome, CodeResult, Completed, Failed, FileResult,
    ImageResult, InvokeOptions, LiveResult, Modality, ModelCatalog, ModelResponse, ModelRole,
    ModelTool, ResearchResult, SafetySetting, TextResult, WorkflowResult,
};
use crate::version::PKG_VERSION;
use crate::{GatewayError, Result};

/// Display name reported by the capabilities endpoint.
pub const ENGINE_NAME: &str = "TRON Ultimate AI Engine";

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];
const SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

/// The capability engine. Construct with [`Engine::builder`].
pub struct Engine {
    client: Arc<dyn ModelClient>,
    metrics: Arc<MetricsAggregator>,
    audit: AuditLog,
    models: ModelCatalog,
    files_dir: PathBuf,
    timeout: Duration,
    permits: Semaphore,
    count_workflow_subtasks: bool,
}

/// Full analytics report: the metrics snapshot plus static status maps.
#[derive(Debug, Clone, Serialize)]
pub struct SystemAnalytics {
    #[serde(flatten)]
    pub snapshot: MetricsSnapshot,
    pub models_status: BTreeMap<&'static str, &'static str>,
    pub capabilities_status: BTreeMap<Capability, bool>,
}

/// Static description of the engine, its models and capabilities.
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityInfo {
    pub engine_info: EngineInfo,
    pub models: BTreeMap<&'static str, String>,
    pub capabilities: BTreeMap<Capability, CapabilityEntry>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub model_count: usize,
    pub capability_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CapabilityEntry {
    pub description: &'static str,
    /// Model id, or `"Internal"` for capabilities not backed by a model.
    pub model: String,
    pub features: &'static [&'static str],
}

/// One outbound model call and the context needed to report it.
struct Call {
    capability: Capability,
    role: ModelRole,
    prompt: String,
    options: InvokeOptions,
    /// Caller input recorded in the audit trail.
    subject: String,
    /// Request fields echoed back on failure.
    echo: Map<String, Value>,
}

impl Engine {
    /// Create a new builder for configuring the engine.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn metrics(&self) -> &Arc<MetricsAggregator> {
        &self.metrics
    }

    pub fn models(&self) -> &ModelCatalog {
        &self.models
    }

    pub fn files_dir(&self) -> &Path {
        &self.files_dir
    }

    pub fn client_name(&self) -> &str {
        self.client.name()
    }

    // ========================================================================
    // Model-backed capabilities
    // ========================================================================

    #[instrument(skip_all, fields(capability = "text_generation"))]
    pub async fn generate_text(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> CapabilityOutcome<TextResult> {
        let mut options = InvokeOptions::default().temperature(0.7);
        if let Some(system) = system {
            options = options.system(system);
        }
        let call = Call {
            capability: Capability::TextGeneration,
            role: ModelRole::Text,
            prompt: prompt.to_string(),
            options,
            subject: prompt.to_string(),
            echo: echo([("prompt", json!(prompt))]),
        };
        self.run(call, |response| TextResult {
            prompt: prompt.to_string(),
            response: response.text.unwrap_or_default(),
        })
        .await
    }

    /// Generate images. `config` is merged into the generation config and
    /// wins over the defaults.
    #[instrument(skip_all, fields(capability = "image_creation"))]
    pub async fn generate_image(
        &self,
        prompt: &str,
        config: Option<Map<String, Value>>,
    ) -> CapabilityOutcome<ImageResult> {
        let mut options = InvokeOptions::default().modality(Modality::Image);
        for category in SAFETY_CATEGORIES {
            options = options.safety(SafetySetting::new(category, SAFETY_THRESHOLD));
        }
        if let Some(config) = config {
            options = options.extra(config);
        }
        let call = Call {
            capability: Capability::ImageCreation,
            role: ModelRole::ImageGen,
            prompt: prompts::image(prompt),
            options,
            subject: prompt.to_string(),
            echo: echo([("prompt", json!(prompt))]),
        };
        self.run(call, |response| ImageResult {
            prompt: prompt.to_string(),
            images: response.images,
            text: response.text,
        })
        .await
    }

    #[instrument(skip_all, fields(capability = "web_research"))]
    pub async fn research_web(
        &self,
        query: &str,
        context: Option<&str>,
    ) -> CapabilityOutcome<ResearchResult> {
        let options = InvokeOptions::default()
            .tool(ModelTool::GoogleSearch)
            .temperature(0.3)
            .top_p(0.8)
            .top_k(10);
        let call = Call {
            capability: Capability::WebResearch,
            role: ModelRole::WebResearch,
            prompt: prompts::research(query, context),
            options,
            subject: query.to_string(),
            echo: echo([("query", json!(query))]),
        };
        self.run(call, |response| ResearchResult {
            query: query.to_string(),
            results: response.text.unwrap_or_default(),
            context: context.map(str::to_string),
        })
        .await
    }

    #[instrument(skip_all, fields(capability = "code_execution", language = %language))]
    pub async fn execute_code(
        &self,
        code: &str,
        language: &str,
        context: Option<&str>,
    ) -> CapabilityOutcome<CodeResult> {
        let options = InvokeOptions::default()
            .temperature(0.1)
            .top_p(0.9)
            .top_k(40);
        let call = Call {
            capability: Capability::CodeExecution,
            role: ModelRole::CodeExec,
            prompt: prompts::code(code, language, context),
            options,
            subject: code.to_string(),
            echo: echo([("code", json!(code)), ("language", json!(language))]),
        };
        self.run(call, |response| CodeResult {
            code: code.to_string(),
            language: language.to_string(),
            results: response.text.unwrap_or_default(),
            context: context.map(str::to_string),
        })
        .await
    }

    #[instrument(skip_all, fields(capability = "browser_control"))]
    pub async fn control_browser(
        &self,
        task_description: &str,
        url: Option<&str>,
    ) -> CapabilityOutcome<BrowserResult> {
        let options = InvokeOptions::default().temperature(0.2).top_p(0.8);
        let call = Call {
            capability: Capability::BrowserControl,
            role: ModelRole::ComputerUse,
            prompt: prompts::browser(task_description, url),
            options,
            subject: task_description.to_string(),
            echo: echo([("task", json!(task_description))]),
        };
        self.run(call, |response| BrowserResult {
            task: task_description.to_string(),
            url: url.map(str::to_string),
            actions: Vec::new(),
            results: response
                .text
                .unwrap_or_else(|| "Browser control executed".to_string()),
        })
        .await
    }

    #[instrument(skip_all, fields(capability = "live_interactions", interaction_type = %interaction_type))]
    pub async fn live_interaction(
        &self,
        interaction_type: &str,
        data: Map<String, Value>,
    ) -> CapabilityOutcome<LiveResult> {
        let modality = if interaction_type == "audio" {
            Modality::Audio
        } else {
            Modality::Text
        };
        let options = InvokeOptions::default()
            .temperature(0.4)
            .top_p(0.9)
            .modality(modality);
        let call = Call {
            capability: Capability::LiveInteractions,
            role: ModelRole::LiveAudio,
            prompt: prompts::live(interaction_type, &data),
            options,
            subject: interaction_type.to_string(),
            echo: echo([("interaction_type", json!(interaction_type))]),
        };
        self.run(call, |response| LiveResult {
            interaction_type: interaction_type.to_string(),
            response: response.text.unwrap_or_default(),
            data,
            inline_data: response.images,
        })
        .await
    }

    /// Run a multi-task workflow through the thinking model.
    ///
    /// With `count_workflow_subtasks` enabled, each task whose `type` names
    /// a capability also bumps that capability's usage after a successful
    /// run. Unknown task types are ignored.
    #[instrument(skip_all, fields(capability = "workflow_automation", tasks = tasks.len()))]
    pub async fn execute_workflow(
        &self,
        workflow_description: &str,
        tasks: Vec<Map<String, Value>>,
    ) -> CapabilityOutcome<WorkflowResult> {
        let options = InvokeOptions::default()
            .temperature(0.3)
            .top_p(0.8)
            .top_k(32);
        let call = Call {
            capability: Capability::WorkflowAutomation,
            role: ModelRole::Thinking,
            prompt: prompts::workflow(workflow_description, &tasks),
            options,
            subject: workflow_description.to_string(),
            echo: echo([("workflow", json!(workflow_description))]),
        };
        let outcome = self
            .run(call, |response| WorkflowResult {
                workflow: workflow_description.to_string(),
                task_count: tasks.len(),
                results: response.text.unwrap_or_default(),
                tasks,
            })
            .await;

        if self.count_workflow_subtasks
            && let CapabilityOutcome::Success(completed) = &outcome
        {
            for task in &completed.data.tasks {
                if let Some(capability) = task
                    .get("type")
                    .and_then(Value::as_str)
                    .and_then(|t| t.parse::<Capability>().ok())
                {
                    self.metrics.record_subtask(capability);
                }
            }
        }
        outcome
    }

    // ========================================================================
    // Local capabilities
    // ========================================================================

    /// Write `content` to `{files_dir}/{filename}.{format}`.
    #[instrument(skip_all, fields(capability = "file_creation", filename = %filename, format = %format))]
    pub async fn create_file(
        &self,
        content: &str,
        filename: &str,
        format: &str,
    ) -> CapabilityOutcome<FileResult> {
        let capability = Capability::FileCreation;
        let model = self.models.get(ModelRole::Text).to_string();

        let guard = self.metrics.begin(capability);
        let result = files::write(&self.files_dir, filename, format, content).await;
        let processing_time = guard.finish(result.is_ok()).as_secs_f64();

        match result {
            Ok(stored) => {
                info!(file = %stored.name, size = stored.size, processing_time, "file created");
                self.audit.record_generated_file(FileRecord {
                    filename: stored.name.clone(),
                    file_type: format.to_string(),
                    file_path: stored.path.display().to_string(),
                    file_size: stored.size,
                    created_at: Utc::now(),
                });
                let completed = Completed {
                    data: FileResult {
                        filename: filename.to_string(),
                        format: format.to_string(),
                        file_path: stored.path.display().to_string(),
                        download_url: stored.download_url(),
                        size_bytes: stored.size,
                    },
                    capability,
                    model,
                    processing_time,
                    timestamp: Utc::now(),
                };
                self.audit_success(&completed, filename);
                CapabilityOutcome::Success(completed)
            }
            Err(e) => {
                warn!(error = %e, "file creation failed");
                self.audit.record_request(
                    RequestRecord::new(capability, model, filename, processing_time)
                        .failed(e.to_string()),
                );
                CapabilityOutcome::Failure(Failed {
                    capability,
                    error: e.to_string(),
                    echo: echo([("filename", json!(filename)), ("format", json!(format))]),
                    timestamp: Utc::now(),
                })
            }
        }
    }

    /// Contents of a previously generated file.
    pub async fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        files::read(&self.files_dir, name).await
    }

    // ========================================================================
    // Reporting
    // ========================================================================

    /// Metrics snapshot plus model and capability status maps.
    pub fn analytics(&self) -> SystemAnalytics {
        SystemAnalytics {
            snapshot: self.metrics.snapshot(),
            models_status: self.models_status(),
            capabilities_status: Capability::ALL.into_iter().map(|c| (c, true)).collect(),
        }
    }

    /// Every configured model role, reported as active.
    pub fn models_status(&self) -> BTreeMap<&'static str, &'static str> {
        self.models.iter().map(|(role, _)| (role, "active")).collect()
    }

    /// Engine description, model catalog and capability descriptors.
    pub fn capability_info(&self) -> CapabilityInfo {
        let capabilities = Capability::ALL
            .into_iter()
            .map(|capability| {
                let descriptor = capability.descriptor();
                let model = descriptor
                    .model
                    .map_or_else(|| "Internal".to_string(), |role| self.models.get(role).to_string());
                (
                    capability,
                    CapabilityEntry {
                        description: descriptor.description,
                        model,
                        features: descriptor.features,
                    },
                )
            })
            .collect();

        CapabilityInfo {
            engine_info: EngineInfo {
                name: ENGINE_NAME,
                version: PKG_VERSION,
                model_count: self.models.len(),
                capability_count: Capability::COUNT,
            },
            models: self
                .models
                .iter()
                .map(|(role, model)| (role, model.to_string()))
                .collect(),
            capabilities,
            timestamp: Utc::now(),
        }
    }

    // ========================================================================
    // Shared invocation path
    // ========================================================================

    async fn run<T, F>(&self, call: Call, build: F) -> CapabilityOutcome<T>
    where
        T: Serialize,
        F: FnOnce(ModelResponse) -> T,
    {
        let Call {
            capability,
            role,
            prompt,
            options,
            subject,
            echo,
        } = call;
        let model = self.models.get(role).to_string();

        let Ok(_permit) = self.permits.acquire().await else {
            self.metrics.record(capability, Duration::ZERO, false);
            return failure(
                capability,
                GatewayError::Configuration("concurrency limiter closed".into()),
                echo,
            );
        };

        let guard = self.metrics.begin(capability);
        let result = tokio::time::timeout(self.timeout, self.client.invoke(&model, &prompt, &options))
            .await
            .unwrap_or(Err(GatewayError::Timeout(self.timeout)));
        let processing_time = guard.finish(result.is_ok()).as_secs_f64();

        match result {
            Ok(response) => {
                info!(%capability, model = %model, processing_time, "capability completed");
                let completed = Completed {
                    data: build(response),
                    capability,
                    model,
                    processing_time,
                    timestamp: Utc::now(),
                };
                self.audit_success(&completed, &subject);
                CapabilityOutcome::Success(completed)
            }
            Err(e) => {
                warn!(%capability, model = %model, error = %e, "capability failed");
                self.audit.record_request(
                    RequestRecord::new(capability, &model, subject, processing_time)
                        .failed(e.to_string()),
                );
                failure(capability, e, echo)
            }
        }
    }

    fn audit_success<T: Serialize>(&self, completed: &Completed<T>, subject: &str) {
        let response_data = serde_json::to_value(completed).unwrap_or_default();
        self.audit.record_request(
            RequestRecord::new(
                completed.capability,
                &completed.model,
                subject,
                completed.processing_time,
            )
            .response_data(response_data),
        );
        self.audit.record_performance_metric(
            format!("{}_time", completed.capability),
            completed.processing_time,
        );
    }
}

fn failure<T>(capability: Capability, error: GatewayError, echo: Map<String, Value>) -> CapabilityOutcome<T> {
    CapabilityOutcome::Failure(Failed {
        capability,
        error: error.to_string(),
        echo,
        timestamp: Utc::now(),
    })
}

fn echo<const N: usize>(fields: [(&str, Value); N]) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

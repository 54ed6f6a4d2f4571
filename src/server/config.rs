//! Configuration loading for trond.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.tron/config.toml` (user)
//! 3. `/etc/tron/config.toml` (system)
//!
//! When no file exists the built-in defaults are used.
//!
//! Secrets are loaded separately with mandatory permission checks:
//! 1. `~/.tron/secrets.toml` (user, must be 0600)
//! 2. `/etc/tron/secrets.toml` (system, must be 0600)

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analytics::DEFAULT_WINDOW_CAPACITY;
use crate::engine::{DEFAULT_MAX_CONCURRENT, DEFAULT_TIMEOUT};
use crate::providers::RetrySettings;
use crate::providers::gemini::DEFAULT_BASE_URL;
use crate::types::ModelCatalog;
use crate::{GatewayError, Result};

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    /// Role-to-model overrides.
    #[serde(default)]
    pub models: ModelCatalog,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub retry: RetrySettings,
}

/// Server network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8000).
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            limits: LimitsConfig::default(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:8000".to_string()
}

/// Resource limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum concurrent model calls (default: 64).
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
    /// Model call timeout in seconds (default: 120).
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent(),
            request_timeout_secs: default_timeout(),
        }
    }
}

impl LimitsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

/// Metrics aggregation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Number of recent response times kept (default: 1000).
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,
    /// Count workflow tasks against their own capability (default: false).
    #[serde(default)]
    pub count_workflow_subtasks: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            window_capacity: default_window_capacity(),
            count_workflow_subtasks: false,
        }
    }
}

fn default_window_capacity() -> usize {
    DEFAULT_WINDOW_CAPACITY
}

/// Generated file storage.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilesConfig {
    /// Directory for generated files (default: `$TMPDIR/tron_ai_files`).
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Durable audit store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// Supabase project URL. Overridden by `SUPABASE_URL`.
    #[serde(default)]
    pub url: Option<String>,
    /// Postgres schema (default: the project's default schema).
    #[serde(default)]
    pub schema: Option<String>,
}

impl StoreConfig {
    /// Project URL, preferring the `SUPABASE_URL` environment variable.
    pub fn effective_url(&self) -> Option<String> {
        std::env::var("SUPABASE_URL")
            .ok()
            .filter(|url| !url.is_empty())
            .or_else(|| self.url.clone())
    }
}

/// Gemini API endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_url")]
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_url(),
        }
    }
}

fn default_gemini_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Secrets configuration (API keys).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub gemini: Option<ApiKeySecret>,
    /// Supabase service-role key.
    #[serde(default)]
    pub supabase: Option<ApiKeySecret>,
}

/// A single API key secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

/// Secret name → environment variable name mapping.
const SECRET_ENV_VARS: &[(&str, &str)] = &[
    ("gemini", "GEMINI_API_KEY"),
    ("supabase", "SUPABASE_SERVICE_ROLE_KEY"),
];

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided; must exist)
    /// 2. `~/.tron/config.toml`
    /// 3. `/etc/tron/config.toml`
    /// 4. built-in defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Config::default()),
        }
    }

    /// Parse a specific config file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GatewayError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            GatewayError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path; `None` when no file exists.
    pub fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(GatewayError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".tron").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/tron/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Resolution order:
    /// 1. `~/.tron/secrets.toml` (if exists, must be 0600)
    /// 2. `/etc/tron/secrets.toml` (if exists, must be 0600)
    ///
    /// Returns empty secrets if no file exists (keys may come from env vars).
    pub fn load() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(".tron").join("secrets.toml");
            if user_secrets.exists() {
                return Self::load_from_file(&user_secrets);
            }
        }

        let system_secrets = PathBuf::from("/etc/tron/secrets.toml");
        if system_secrets.exists() {
            return Self::load_from_file(&system_secrets);
        }

        Ok(Secrets::default())
    }

    /// Parse a specific secrets file after checking its permissions.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::check_permissions(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            GatewayError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            GatewayError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            GatewayError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        // Reject if group or other bits are set
        if mode & 0o077 != 0 {
            return Err(GatewayError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// Get a key by name, falling back to the corresponding environment variable.
    pub fn api_key(&self, name: &str) -> Option<String> {
        let from_file = match name {
            "gemini" => self.gemini.as_ref(),
            "supabase" => self.supabase.as_ref(),
            _ => None,
        }
        .map(|s| s.api_key.clone());

        from_file.or_else(|| {
            SECRET_ENV_VARS
                .iter()
                .find(|(secret, _)| *secret == name)
                .and_then(|(_, env_var)| std::env::var(env_var).ok())
                .filter(|key| !key.is_empty())
        })
    }

    /// Environment variable names of required secrets that are set neither
    /// in the secrets file nor in the environment.
    ///
    /// Only the Gemini key is required; the store is optional.
    pub fn missing(&self) -> Vec<&'static str> {
        if self.api_key("gemini").is_none() {
            vec!["GEMINI_API_KEY"]
        } else {
            Vec::new()
        }
    }
}

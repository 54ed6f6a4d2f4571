//! trond: the TRON gateway daemon.
//!
//! Serves the capability [`Engine`](tron_gateway::Engine) over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use tron_gateway::server::config::{Config, Secrets};
use tron_gateway::server::{AppState, router};
use tron_gateway::store::{AuditStore, DisabledStore, SupabaseStore};
use tron_gateway::{
    Engine, GatewayError, GeminiClient, MetricsAggregator, ModelClient, RetryConfig,
    RetryingModelClient,
};

/// TRON gateway daemon serving generative-AI capabilities over HTTP.
#[derive(Parser)]
#[command(name = "trond")]
#[command(version = tron_gateway::PKG_VERSION)]
#[command(about = "TRON generative-AI gateway daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "TRON_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Address to bind to (overrides `server.address`).
    #[arg(short, long)]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Load configuration
    let config = Config::load(args.config.as_deref())?;
    let secrets = Secrets::load()?;

    let address = args.address.unwrap_or_else(|| config.server.address.clone());
    let addr: SocketAddr = address
        .parse()
        .map_err(|e| GatewayError::Configuration(format!("Invalid address {address:?}: {e}")))?;

    let missing = secrets.missing();
    if !missing.is_empty() {
        warn!(missing = ?missing, "required secrets not configured; model calls will fail");
    }

    let store = build_store(&config, &secrets).await?;
    let engine = Arc::new(build_engine(&config, &secrets, store)?);
    let state = AppState::new(engine.clone()).with_missing_secrets(missing);

    info!(
        version = tron_gateway::version_string(),
        %addr,
        client = engine.client_name(),
        files_dir = %engine.files_dir().display(),
        "trond starting"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("trond stopped");
    Ok(())
}

/// Build the engine from configuration.
fn build_engine(
    config: &Config,
    secrets: &Secrets,
    store: Arc<dyn AuditStore>,
) -> Result<Engine, GatewayError> {
    let api_key = secrets.api_key("gemini").unwrap_or_default();
    let gemini = GeminiClient::with_base_url(api_key, &config.gemini.base_url)?;
    let retry: RetryConfig = config.retry.clone().into();
    let client: Arc<dyn ModelClient> = Arc::new(RetryingModelClient::new(Arc::new(gemini), retry));

    let metrics = Arc::new(MetricsAggregator::with_window_capacity(
        config.metrics.window_capacity,
    ));

    let mut builder = Engine::builder()
        .client(client)
        .metrics(metrics)
        .store(store)
        .models(config.models.clone())
        .timeout(config.server.limits.request_timeout())
        .max_concurrent(config.server.limits.max_concurrent_requests)
        .count_workflow_subtasks(config.metrics.count_workflow_subtasks);
    if let Some(dir) = &config.files.dir {
        builder = builder.files_dir(dir);
    }
    builder.build()
}

/// Connect the audit store, falling back to a disabled store when
/// credentials are missing or the store is unreachable.
async fn build_store(config: &Config, secrets: &Secrets) -> Result<Arc<dyn AuditStore>, GatewayError> {
    let (Some(url), Some(key)) = (config.store.effective_url(), secrets.api_key("supabase")) else {
        warn!("store credentials not found; audit logging disabled");
        return Ok(Arc::new(DisabledStore));
    };

    let mut store = SupabaseStore::new(url, key)?;
    if let Some(schema) = &config.store.schema {
        store = store.with_schema(schema);
    }
    match store.ping().await {
        Ok(()) => {
            info!("audit store connected");
            Ok(Arc::new(store))
        }
        Err(e) => {
            warn!(error = %e, "audit store unreachable; continuing without audit logging");
            Ok(Arc::new(DisabledStore))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

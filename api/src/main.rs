use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;

mod handlers;
mod middleware;
mod routes;
mod state;

use common::auth::JwtService;
use common::bindings::BindingResolver;
use common::config::Settings;
use common::registry::{InMemoryJobStore, JobRegistry};
use common::script::{AssignmentEvaluator, DistributedBackend, InMemoryBackend, ScriptEvaluator};
use common::sink::SinkWriter;
use common::source::SourceReader;
use common::storage::{ObjectStore, S3ObjectStore};
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; logging level comes from it
    let config = Settings::load()?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    common::telemetry::init_logging(&config.observability.log_level)?;
    common::telemetry::init_metrics(config.observability.metrics_port)?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        "Starting API server"
    );

    // Object store client shared by sources and sinks
    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(&config.object_store)?);
    tracing::info!("Object store client initialized");

    let reader = SourceReader::new(store.clone());
    let resolver = BindingResolver::new(reader.clone(), config.registry.partial_binding_policy);
    let sinks = SinkWriter::new(store);

    // Deployments swap in their own interpreter here
    let evaluator: Arc<dyn ScriptEvaluator> = Arc::new(AssignmentEvaluator::new());
    let in_memory = InMemoryBackend::new(evaluator.clone());
    let distributed = DistributedBackend::new(evaluator, config.engine.clone());

    let job_store = Arc::new(InMemoryJobStore::new(config.registry.job_ttl_seconds));
    let registry = JobRegistry::new(
        job_store,
        resolver,
        sinks,
        in_memory,
        distributed,
        config.registry.output_failure_policy,
    );

    let jwt = JwtService::new(&config.auth.jwt_secret, config.auth.jwt_expiration_hours);
    let state = AppState::new(registry, reader, jwt, config.clone());

    let app = routes::create_router(state);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));
    tracing::info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Initiating graceful shutdown");
}

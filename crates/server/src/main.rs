use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docrunner_core::{
    create_authenticator, load_config, stages_from_config, validate_config, Authenticator,
    CommandRunner, PipelineOrchestrator, ProcessRunner, RunnerConfig,
};
use docrunner_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("DOCRUNNER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Auth method: {:?}", config.auth.method);
    info!("Workspace root: {:?}", config.workspace.root);

    // Stages expect both working directories to exist
    let workspace = &config.workspace;
    for dir in [workspace.staging_path(), workspace.processing_path()] {
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create directory {:?}", dir))?;
    }

    // Create authenticator
    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    // Create the stage runner and orchestrator
    let runner: Arc<dyn ProcessRunner> = Arc::new(CommandRunner::new(RunnerConfig {
        working_dir: Some(workspace.root.clone()),
        env: config.stages.env.clone(),
    }));
    let stages = stages_from_config(&config.stages);
    info!(
        "Pipeline: {} stages via {} ({})",
        stages.len(),
        config.stages.interpreter,
        stages
            .iter()
            .map(|s| s.script.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    );
    let orchestrator = Arc::new(PipelineOrchestrator::new(
        runner,
        stages,
        workspace.clone(),
    ));

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), authenticator, orchestrator));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

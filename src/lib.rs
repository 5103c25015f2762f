pub mod access;
pub mod api;
pub mod auth;
pub mod backend;
pub mod config;
pub mod content;
pub mod dashboard;
pub mod db;
pub mod models;
pub mod records;
pub mod report;
pub mod roster;
pub mod storage;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Errors that stop the service from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Backend error: {0}")]
    Backend(#[from] backend::BackendError),
    #[error("Server error: {0}")]
    Server(#[from] api::ServerError),
    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Start the service and block until Ctrl-C.
pub fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::ServerConfig::from_env()?;
    let backend = backend::Backend::open(&config)?;
    let ctx = api::ApiContext::new(Arc::new(backend)).with_plan(config.plan);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let mut server = api::start_server(ctx, config.bind).await?;
        tracing::info!(
            addr = %server.session.server_addr,
            origin = %config.public_origin,
            plan = %config.plan,
            "Serving"
        );

        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {e}");
        }
        server.shutdown();
        server.stopped().await;
        Ok::<(), StartupError>(())
    })
}

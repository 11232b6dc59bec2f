use anyhow::Result;
use axum::Router;
use cameras::{
    config::{self, DataBackend},
    routes,
    services::model::CameraModel,
    state::AppState,
};
use std::{fs, io::ErrorKind, path::Path};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting cameras with config: {:?}", cfg);

    // --- Initialize storage backend (applies the SQLite schema) ---
    let model = CameraModel::connect(cfg.data_backend, &cfg.database_url).await?;

    // --- Handle migration mode ---
    if migrate {
        match &model {
            CameraModel::Sqlite(_) => tracing::info!("Database migration complete."),
            CameraModel::Memory(_) => {
                tracing::warn!("Nothing to migrate for the memory backend");
            }
        }
        return Ok(()); // exit after migration
    }

    if cfg.data_backend == DataBackend::Memory {
        tracing::warn!("Using the memory backend; records are lost on restart");
    }

    // --- Ensure image directory exists ---
    if cfg.router.has_upload() && !Path::new(&cfg.image_dir).exists() {
        fs::create_dir_all(&cfg.image_dir)?;
        tracing::info!("Created image directory at {}", cfg.image_dir);
    }

    // --- Build router ---
    let state = AppState::from_config(model, &cfg)?;
    let app: Router = routes::routes::app(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}

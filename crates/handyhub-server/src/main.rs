mod api;
mod middleware;

use std::sync::Arc;

use anyhow::Context;
use handyhub_blob::BlobClient;
use handyhub_core::{AppConfig, Catalog};
use handyhub_maps::DistanceMatrixClient;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limits, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = handyhub_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(?config, "configuration loaded");

    let state = build_state(&config).await?;
    let auth = AuthState::from_config(config.admin_password.as_deref(), config.is_development())?;
    let app = build_app(state, auth, default_rate_limits());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        env = %config.env,
        store = %config.store_backend,
        "handyhub server listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let catalog = match config.catalog_path.as_deref() {
        Some(path) => handyhub_core::load_catalog(path)
            .with_context(|| format!("loading catalog from {}", path.display()))?,
        None => Catalog::builtin(),
    };

    let store = handyhub_db::open_store(config)
        .await
        .with_context(|| format!("opening {} request store", config.store_backend))?;

    let maps = match config.maps_api_key.as_deref() {
        Some(key) => Some(Arc::new(DistanceMatrixClient::with_base_url(
            key,
            config.http_timeout_secs,
            &config.maps_base_url,
        )?)),
        None => {
            tracing::warn!("GOOGLE_MAPS_API_KEY not set; distance estimates disabled");
            None
        }
    };

    let blob = match config.blob_token.as_deref() {
        Some(token) => Some(Arc::new(BlobClient::with_base_url(
            token,
            config.http_timeout_secs,
            &config.blob_base_url,
        )?)),
        None => {
            tracing::warn!("BLOB_READ_WRITE_TOKEN not set; photo uploads disabled");
            None
        }
    };

    tracing::info!(
        categories = catalog.categories.len(),
        services = catalog.service_count(),
        "service catalog ready"
    );

    Ok(AppState {
        store,
        catalog: Arc::new(catalog),
        maps,
        blob,
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}

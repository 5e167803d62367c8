//! HTTP server for the prompt admin API

use crate::{api, config::Config, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use versa_prompts::PromptManager;
use versa_storage::StorageManager;

/// Build the application router
pub fn build_router(manager: Arc<PromptManager>) -> Router {
    Router::new()
        .route("/api/health", get(api::health))
        .route("/api/agents", get(api::agents_list))
        .route("/api/agents/:agent_type/prompts", get(api::agent_prompts))
        .route("/api/prompts", get(api::prompts_list))
        .route(
            "/api/prompts/:agent_type/:prompt_name",
            get(api::prompt_active),
        )
        .route(
            "/api/prompts/:agent_type/:prompt_name/history",
            get(api::prompt_history),
        )
        .route(
            "/api/prompts/:agent_type/:prompt_name/versions",
            post(api::version_create),
        )
        .route(
            "/api/prompts/:agent_type/:prompt_name/versions/:version",
            get(api::prompt_version),
        )
        .route(
            "/api/prompts/:agent_type/:prompt_name/versions/:version/activate",
            post(api::version_activate),
        )
        .route(
            "/api/prompts/:agent_type/:prompt_name/usage",
            post(api::usage_record),
        )
        .route("/api/export", get(api::export))
        .route("/api/stats", get(api::system_stats))
        .with_state(manager)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Open the store described by `config` and wrap it in a prompt manager
pub async fn open_manager(config: &Config) -> Result<Arc<PromptManager>> {
    let storage = Arc::new(StorageManager::new(&config.database).await?);
    let catalog = config.catalog()?;
    Ok(Arc::new(PromptManager::with_catalog(storage, catalog)))
}

/// Admin API server
pub struct Server {
    config: Config,
    manager: Arc<PromptManager>,
}

impl Server {
    /// Create a new server instance
    pub async fn new(config: Config) -> Result<Self> {
        info!("Initializing server components");
        let manager = open_manager(&config).await?;
        Ok(Self { config, manager })
    }

    pub fn manager(&self) -> &Arc<PromptManager> {
        &self.manager
    }

    /// Serve until Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<()> {
        let addr = self.config.server_addr().await?;
        let app = build_router(self.manager.clone());

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Prompt admin API listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown())
            .await?;

        info!("Shutting down server...");
        self.manager.storage().close().await;
        info!("Server shutdown complete");
        Ok(())
    }
}

/// Wait for shutdown signal
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

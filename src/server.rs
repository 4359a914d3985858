/// Server setup and initialization
///
/// Wires together all components: snapshot storage, the file backend, the
/// editor session and HTTP routes. Provides the main application factory
/// function for creating the Axum app.

use crate::{
    api::{create_editor_routes, create_file_routes, create_workflow_routes, AppState},
    backend::{upload::AcceptList, FileBackend, MemoryBackend, SupabaseBackend},
    config::Config,
    session::EditorSession,
    workflow::{
        storage::WorkflowStorage,
        store::{StoreEvent, WorkflowStore},
    },
};
use anyhow::Result;
use axum::{routing::get, Router};
use std::{path::Path, sync::Arc};
use tokio::{net::TcpListener, sync::broadcast};

/// Create the main Axum application with all routes
///
/// Opens the snapshot database, picks the file backend (remote when a
/// project URL is configured, in-memory otherwise) and starts the event log.
pub async fn create_app(config: Config) -> Result<Router> {
    tracing::info!("📁 Ensuring data directory exists: {}", config.database.data_dir);
    std::fs::create_dir_all(&config.database.data_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create data directory: {}", e))?;

    tracing::info!("📋 Initializing workflow snapshot storage");
    let db_path = Path::new(&config.database.data_dir).join("workflows.db");
    let storage = WorkflowStorage::open(&db_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open workflow database: {}", e))?;

    let backend: Arc<dyn FileBackend> = if config.backend.is_remote() {
        tracing::info!("☁️ Using storage backend at {}", config.backend.url);
        Arc::new(SupabaseBackend::new(&config.backend)?)
    } else {
        tracing::warn!("No storage backend URL configured, keeping files in memory");
        Arc::new(MemoryBackend::new())
    };

    let owner = match backend.current_user_id().await {
        Ok(owner) => owner,
        Err(e) => {
            tracing::warn!("Could not resolve current user, saving anonymously: {}", e);
            None
        }
    };
    let store = match owner {
        Some(owner) => WorkflowStore::new().with_owner(owner),
        None => WorkflowStore::new(),
    };

    let events = store.subscribe();
    tokio::spawn(log_store_events(events));

    let session = EditorSession::new(store, AcceptList::parse(&config.backend.accept));
    let state = AppState::new(session, storage, backend);

    tracing::info!("✅ Application initialized successfully");
    Ok(build_router(state))
}

/// Router over an already assembled state
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        .merge(create_editor_routes())
        .merge(create_file_routes())
        .merge(create_workflow_routes())
        .with_state(state)
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting FlowFinance editor server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Log saves and run requests published by the session's store
async fn log_store_events(mut events: broadcast::Receiver<StoreEvent>) {
    loop {
        match events.recv().await {
            Ok(StoreEvent::Saved(workflow)) => {
                tracing::info!("💾 Saved workflow {} ({})", workflow.id, workflow.name);
            }
            Ok(StoreEvent::RunRequested(request)) => {
                let graph = serde_json::json!({
                    "blocks": request.blocks,
                    "connections": request.connections,
                });
                tracing::info!("▶️ Run requested: {}", graph);
            }
            Ok(event) => tracing::debug!("Store event: {:?}", event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Event log lagged, skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}

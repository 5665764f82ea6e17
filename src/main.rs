//! Kanban Board Sync Server - Binary Entry Point
//!
//! Serves the WebSocket endpoint and board REST routes until Ctrl+C, then
//! shuts the realtime state down.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use kanban_sync::{
    create_router, AppState, JwtAuth, MemoryStore, ServerConfig, StoreActivityLogger,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("kanban_sync=info,tower_http=info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let verifier = Arc::new(
        JwtAuth::new(&config.jwt_secret)?.with_access_token_ttl(config.access_token_ttl),
    );
    let store = Arc::new(MemoryStore::new());
    let activity = Arc::new(StoreActivityLogger::new(store.clone()));

    let state = AppState::init(&config, verifier, store, activity);
    let app = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(
        "{} v{} listening on {}",
        kanban_sync::NAME,
        kanban_sync::VERSION,
        listener.local_addr()?
    );

    let shutdown_state = state.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Open sockets would otherwise hold the graceful drain forever
            shutdown_state.shutdown();
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        // Without a signal handler, keep serving until the process is killed
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::rest::boards;
use crate::realtime::{ws_handler, AppState};

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration - allow all origins for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // WebSocket endpoint
        .route("/ws", get(ws_handler))
        // Health check
        .route("/health", get(health_check))
        // Boards, columns and cards
        .route("/api/boards", post(boards::create_board))
        .route(
            "/api/boards/:board_id/columns",
            get(boards::list_columns).post(boards::create_column),
        )
        .route(
            "/api/boards/:board_id/columns/:column_id/cards",
            post(boards::create_card),
        )
        .route("/api/boards/:board_id/cards", get(boards::list_cards))
        .route(
            "/api/boards/:board_id/cards/:card_id",
            patch(boards::update_card).delete(boards::delete_card),
        )
        .route("/api/boards/:board_id/cards/:card_id/move", patch(boards::move_card))
        .route(
            "/api/boards/:board_id/cards/:card_id/comments",
            post(boards::add_comment),
        )
        .route(
            "/api/boards/:board_id/columns/:column_id/move",
            patch(boards::move_column),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

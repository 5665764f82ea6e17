//! Kanban Board Sync Server
//!
//! Real-time synchronization of Kanban boards over WebSocket. Clients join a
//! board, every committed card change on that board is pushed to them as a
//! board event, and a client-side reducer applies those events to its local
//! copy of the board.
//!
//! # Modules
//!
//! - `types`: Board records (Card, Column, Comment, Board, Workspace) and board events
//! - `sequence`: Sequence renumbering for drag-and-drop reorders
//! - `realtime`: Connection registry, broadcaster, gateway and WebSocket handler
//! - `client`: Client-side board state and event reducer
//! - `service`: Card, comment and column mutations that publish board events
//! - `store`: Document store trait and in-memory implementation
//! - `activity`: Fire-and-forget board activity log
//! - `auth`: Bearer token verification (JWT)
//! - `api`: Axum router and REST endpoints
//! - `config`: Server configuration from the environment
//! - `error`: Service errors and their HTTP mapping
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use kanban_sync::{
//!     create_router, AppState, JwtAuth, MemoryStore, ServerConfig, StoreActivityLogger,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::from_env()?;
//!     let verifier = Arc::new(JwtAuth::new(&config.jwt_secret)?);
//!     let store = Arc::new(MemoryStore::new());
//!     let activity = Arc::new(StoreActivityLogger::new(store.clone()));
//!
//!     let state = AppState::init(&config, verifier, store, activity);
//!     let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
//!     axum::serve(listener, create_router(state.clone())).await?;
//!     state.shutdown();
//!     Ok(())
//! }
//! ```

pub mod activity;
pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod realtime;
pub mod sequence;
pub mod service;
pub mod store;
pub mod types;

// Re-export commonly used items at crate root
pub use activity::{ActivityEntry, ActivityLogger, StoreActivityLogger};
pub use api::create_router;
pub use auth::{AuthError, AuthVerifier, JwtAuth, SharedVerifier};
pub use client::{ApplyOutcome, BoardState};
pub use config::{ConfigError, ServerConfig};
pub use error::ServiceError;
pub use realtime::{AppState, BoardBroadcaster, ConnectionRegistry, DeliveryReport, Gateway};
pub use service::BoardService;
pub use store::{DocumentStore, MemoryStore, StoreError};
pub use types::{BoardEvent, BoardEventKind, Card, CardPatch, Column, Comment, Workspace};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

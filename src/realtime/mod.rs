//! Realtime board sync over WebSocket
//!
//! - `registry`: which connections are viewing which board
//! - `broadcaster`: fan board events out to a board's viewers
//! - `gateway`: per-connection lifecycle (handshake, join, leave, close)
//! - `handler`: axum WebSocket upgrade and socket loop
//! - `state`: process-wide state with an explicit init/shutdown lifecycle

pub mod broadcaster;
pub mod connection;
pub mod gateway;
pub mod handler;
pub mod messages;
pub mod registry;
pub mod state;

pub use broadcaster::{BoardBroadcaster, DeliveryReport};
pub use connection::{Connection, ConnectionId, DeliveryError, Frame};
pub use gateway::{ConnectionState, Gateway, GatewaySession};
pub use handler::ws_handler;
pub use messages::{ClientMessage, ServerMessage};
pub use registry::ConnectionRegistry;
pub use state::AppState;

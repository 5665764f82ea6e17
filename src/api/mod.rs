//! HTTP surface: WebSocket endpoint, health check and board mutation routes

pub mod http;
pub mod rest;

pub use http::create_router;
pub use rest::ApiError;

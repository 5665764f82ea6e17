//! WebSocket connection handler

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tokio::sync::{mpsc, watch};

use super::connection::Frame;
use super::gateway::GatewaySession;
use super::messages::{ClientMessage, ServerMessage};
use super::state::AppState;
use crate::api::ApiError;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Bearer token, for clients that cannot set headers
    pub token: Option<String>,
}

/// Credential from the `Authorization` header, else the `token` query parameter
pub fn handshake_credential(headers: &HeaderMap, params: &WsParams) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| params.token.clone())
}

/// WebSocket upgrade handler
///
/// The credential is verified before the upgrade; a rejected handshake gets
/// `401` and never becomes a WebSocket.
pub async fn ws_handler(
    ws: Option<WebSocketUpgrade>,
    headers: HeaderMap,
    Query(params): Query<WsParams>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let credential = handshake_credential(&headers, &params);

    let (session, outbound) = match state.gateway().open(credential.as_deref()) {
        Ok(opened) => opened,
        Err(e) => {
            tracing::warn!("[Gateway] Handshake rejected: {}", e);
            let body = Json(ApiError::unauthorized(e.to_string()));
            return (StatusCode::UNAUTHORIZED, body).into_response();
        }
    };

    match ws {
        Some(ws) => {
            tracing::info!(
                "[Gateway] {} connected as {}",
                session.connection().id(),
                session.connection().principal()
            );
            let closing = state.closing();
            ws.on_upgrade(move |socket| handle_socket(socket, session, outbound, closing))
        }
        None => {
            let body = Json(ApiError::bad_request("Expected a WebSocket upgrade"));
            (StatusCode::BAD_REQUEST, body).into_response()
        }
    }
}

/// Handle an individual WebSocket connection
async fn handle_socket(
    mut socket: WebSocket,
    mut session: GatewaySession,
    mut outbound: mpsc::Receiver<Frame>,
    mut closing: watch::Receiver<bool>,
) {
    if send_control(&mut socket, &session.welcome()).await.is_err() {
        session.close();
        return; // Client disconnected immediately
    }

    loop {
        tokio::select! {
            // Board events queued by the broadcaster
            frame = outbound.recv() => {
                match frame {
                    Some(frame) => {
                        if socket.send(Message::Text(frame.to_string())).await.is_err() {
                            break; // Client disconnected
                        }
                    }
                    None => break, // Queue closed
                }
            }

            // Server shutting down
            _ = closing.changed() => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }

            // Handle client messages
            result = socket.recv() => {
                match result {
                    Some(Ok(msg)) => {
                        if !handle_client_message(msg, &mut session, &mut socket).await {
                            break;
                        }
                    }
                    Some(Err(_)) => break, // WebSocket error
                    None => break, // Client disconnected
                }
            }
        }
    }

    session.close();
}

async fn send_control(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), axum::Error> {
    match serde_json::to_string(message) {
        Ok(json) => socket.send(Message::Text(json)).await,
        Err(e) => {
            tracing::error!("[Gateway] Failed to serialize control frame: {}", e);
            Ok(())
        }
    }
}

/// Handle a message from the client
/// Returns false if the connection should be closed
async fn handle_client_message(
    msg: Message,
    session: &mut GatewaySession,
    socket: &mut WebSocket,
) -> bool {
    match msg {
        Message::Text(text) => {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    if let Some(reply) = session.handle(client_msg) {
                        return send_control(socket, &reply).await.is_ok();
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        "[Gateway] {} sent an unreadable frame: {}",
                        session.connection().id(),
                        e
                    );
                    let reply = ServerMessage::error("bad_message", e.to_string());
                    return send_control(socket, &reply).await.is_ok();
                }
            }
            true
        }
        Message::Binary(_) => true, // Ignore binary messages
        Message::Ping(data) => socket.send(Message::Pong(data)).await.is_ok(),
        Message::Pong(_) => true, // Ignore pong responses
        Message::Close(_) => false, // Client requested close
    }
}

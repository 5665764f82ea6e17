//! WebSocket tests against a live server on a loopback port

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tower::util::ServiceExt;

use kanban_sync::store::{to_document, BOARDS, CARDS, COLUMNS};
use kanban_sync::types::Board;
use kanban_sync::{
    create_router, AppState, Card, Column, DocumentStore, JwtAuth, MemoryStore, ServerConfig,
    StoreActivityLogger,
};

const SECRET: &str = "test-secret-key-that-is-at-least-32-characters-long";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Server {
    state: Arc<AppState>,
    app: Router,
    auth: JwtAuth,
    addr: SocketAddr,
}

async fn start_server() -> Server {
    let store = Arc::new(MemoryStore::new());
    let mut board = Board::new("board-1", "Launch", "alice");
    board.users.push("bob".to_string());
    store.insert(BOARDS, to_document(&board).unwrap()).unwrap();
    for column in [
        Column::new("col-1", "board-1", "To do", 1),
        Column::new("col-2", "board-1", "Doing", 2),
    ] {
        store.insert(COLUMNS, to_document(&column).unwrap()).unwrap();
    }
    for card in [
        Card::new("card-7", "board-1", "col-1", 1, "Write release notes"),
        Card::new("card-a", "board-1", "col-2", 1, "Fix login"),
    ] {
        store.insert(CARDS, to_document(&card).unwrap()).unwrap();
    }

    let activity = Arc::new(StoreActivityLogger::new(store.clone()));
    let state = AppState::init(
        &ServerConfig::new(SECRET),
        Arc::new(JwtAuth::new(SECRET).unwrap()),
        store,
        activity,
    );
    let app = create_router(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let served = app.clone();
    tokio::spawn(async move {
        axum::serve(listener, served).await.unwrap();
    });

    Server {
        state,
        app,
        auth: JwtAuth::new(SECRET).unwrap(),
        addr,
    }
}

impl Server {
    fn token(&self, principal: &str) -> String {
        self.auth.issue_token(principal).unwrap()
    }

    async fn connect(&self, principal: &str) -> Socket {
        let mut request = format!("ws://{}/ws", self.addr).into_client_request().unwrap();
        request.headers_mut().insert(
            tungstenite::http::header::AUTHORIZATION,
            format!("Bearer {}", self.token(principal)).parse().unwrap(),
        );
        let (socket, _) = connect_async(request).await.unwrap();
        socket
    }
}

/// Next text frame as JSON, skipping transport frames
async fn next_json(socket: &mut Socket) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("no frame within 5s")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn send_json(socket: &mut Socket, value: Value) {
    socket.send(Message::Text(value.to_string())).await.unwrap();
}

/// Round-trip a ping so every earlier client frame has been handled
async fn sync(socket: &mut Socket) {
    send_json(socket, json!({ "type": "ping" })).await;
    assert_eq!(next_json(socket).await["type"], json!("pong"));
}

#[tokio::test]
async fn test_joined_socket_receives_card_move() {
    let server = start_server().await;
    let mut socket = server.connect("bob").await;

    let welcome = next_json(&mut socket).await;
    assert_eq!(welcome["type"], json!("connected"));
    assert_eq!(welcome["userId"], json!("bob"));

    send_json(&mut socket, json!({ "type": "join_board", "boardId": "board-1" })).await;
    sync(&mut socket).await;
    assert_eq!(server.state.registry().subscribers_of("board-1").len(), 1);

    let response = server
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/api/boards/board-1/cards/card-7/move")
                .header(header::AUTHORIZATION, format!("Bearer {}", server.token("alice")))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "columnId": "col-2", "index": 0 }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let moved = next_json(&mut socket).await;
    assert_eq!(moved["type"], json!("CARD_MOVED"));
    assert_eq!(moved["boardId"], json!("board-1"));
    assert_eq!(moved["payload"]["card"]["_id"], json!("card-7"));
    assert_eq!(moved["payload"]["oldColumnId"], json!("col-1"));
    assert_eq!(moved["payload"]["newColumnId"], json!("col-2"));
    assert_eq!(moved["payload"]["userId"], json!("alice"));

    let shifted = next_json(&mut socket).await;
    assert_eq!(shifted["type"], json!("CARD_UPDATED"));
    assert_eq!(shifted["payload"]["card"], json!({ "_id": "card-a", "sequence": 2 }));
}

#[tokio::test]
async fn test_unreadable_frame_gets_error_and_socket_stays_open() {
    let server = start_server().await;
    let url = format!("ws://{}/ws?token={}", server.addr, server.token("alice"));
    let (mut socket, _) = connect_async(url).await.unwrap();
    assert_eq!(next_json(&mut socket).await["type"], json!("connected"));

    socket.send(Message::Text("not json".to_string())).await.unwrap();
    let reply = next_json(&mut socket).await;
    assert_eq!(reply["type"], json!("error"));
    assert_eq!(reply["code"], json!("bad_message"));

    send_json(&mut socket, json!({ "type": "join_board" })).await;
    assert_eq!(next_json(&mut socket).await["code"], json!("bad_message"));

    sync(&mut socket).await;
    assert_eq!(server.state.registry().board_count(), 0);
}

#[tokio::test]
async fn test_leave_and_disconnect_over_socket() {
    let server = start_server().await;
    let mut socket = server.connect("alice").await;
    next_json(&mut socket).await;

    send_json(&mut socket, json!({ "type": "join_board", "boardId": "board-1" })).await;
    send_json(&mut socket, json!({ "type": "leave_board", "boardId": "board-1" })).await;
    sync(&mut socket).await;
    assert!(!server.state.registry().has_board("board-1"));

    send_json(&mut socket, json!({ "type": "join_board", "boardId": "board-1" })).await;
    sync(&mut socket).await;
    socket.close(None).await.unwrap();

    let registry = server.state.registry().clone();
    tokio::time::timeout(Duration::from_secs(5), async move {
        while registry.has_board("board-1") {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("subscription outlived the socket");
}

#[tokio::test]
async fn test_shutdown_sends_close_frame() {
    let server = start_server().await;
    let mut socket = server.connect("alice").await;
    next_json(&mut socket).await;
    send_json(&mut socket, json!({ "type": "join_board", "boardId": "board-1" })).await;
    sync(&mut socket).await;

    server.state.shutdown();

    let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("no close frame within 5s");
    assert!(matches!(message, Some(Ok(Message::Close(_)))), "got {:?}", message);
    assert_eq!(server.state.registry().board_count(), 0);
}

#[tokio::test]
async fn test_upgrade_without_credential_is_refused() {
    let server = start_server().await;

    match connect_async(format!("ws://{}/ws", server.addr)).await {
        Err(tungstenite::Error::Http(response)) => assert_eq!(response.status().as_u16(), 401),
        other => panic!("expected a 401 handshake, got {:?}", other.map(|(_, r)| r.status())),
    }
}

//! Integration tests for realtime board sync

use std::sync::Arc;

use tokio::sync::mpsc;

use kanban_sync::realtime::{ConnectionState, Frame, GatewaySession};
use kanban_sync::store::{to_document, BOARDS, CARDS, COLUMNS};
use kanban_sync::types::{Board, BoardEventKind};
use kanban_sync::{
    AppState, ApplyOutcome, AuthError, BoardEvent, BoardState, Card, Column, DocumentStore,
    JwtAuth, MemoryStore, ServerConfig, StoreActivityLogger,
};

const SECRET: &str = "test-secret-key-that-is-at-least-32-characters-long";

fn setup() -> (Arc<AppState>, JwtAuth) {
    let store = Arc::new(MemoryStore::new());

    let mut board = Board::new("board-1", "Launch", "alice");
    board.users.push("bob".to_string());
    store.insert(BOARDS, to_document(&board).unwrap()).unwrap();
    store
        .insert(BOARDS, to_document(&Board::new("board-2", "Other", "carol")).unwrap())
        .unwrap();

    for column in [
        Column::new("col-1", "board-1", "To do", 1),
        Column::new("col-2", "board-1", "Doing", 2),
    ] {
        store.insert(COLUMNS, to_document(&column).unwrap()).unwrap();
    }
    for card in [
        Card::new("card-7", "board-1", "col-1", 1, "Write release notes"),
        Card::new("card-8", "board-1", "col-1", 2, "Tag release"),
        Card::new("card-a", "board-1", "col-2", 1, "Fix login"),
        Card::new("card-b", "board-1", "col-2", 2, "Review PR"),
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
    (state, JwtAuth::new(SECRET).unwrap())
}

fn connect(
    state: &AppState,
    auth: &JwtAuth,
    principal: &str,
    board_id: &str,
) -> (GatewaySession, mpsc::Receiver<Frame>) {
    let token = format!("Bearer {}", auth.issue_token(principal).unwrap());
    let (mut session, rx) = state.gateway().open(Some(token.as_str())).unwrap();
    session.join_board(board_id);
    (session, rx)
}

fn drain(rx: &mut mpsc::Receiver<Frame>) -> Vec<Frame> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(frame);
    }
    frames
}

#[tokio::test]
async fn test_card_move_reaches_other_client() {
    let (state, auth) = setup();
    let (_a, mut a_rx) = connect(&state, &auth, "alice", "board-1");
    let (_b, mut b_rx) = connect(&state, &auth, "bob", "board-1");

    // Client B's local copy from its last fetch
    let mut b_board = BoardState::new("board-1");
    b_board.replace_cards(state.service().list_cards("board-1", "bob").unwrap());
    let before = b_board.clone();

    // Client A drags card-7 from col-1 (index 0) to the end of col-2
    let moved = state
        .service()
        .move_card("board-1", "card-7", "col-2", 2, "alice")
        .unwrap();
    assert_eq!(moved.sequence, 3);

    let frames = drain(&mut b_rx);
    assert_eq!(frames.len(), 1);

    let event: BoardEvent = serde_json::from_str(&frames[0]).unwrap();
    assert_eq!(event.type_name(), "CARD_MOVED");
    match &event.kind {
        BoardEventKind::CardMoved(payload) => {
            assert_eq!(payload.card.id, "card-7");
            assert_eq!(payload.old_column_id, "col-1");
            assert_eq!(payload.new_column_id, "col-2");
            assert_eq!(payload.card.sequence, 3);
            assert_eq!(payload.user_id, "alice");
        }
        other => panic!("expected CARD_MOVED, got {:?}", other),
    }

    assert_eq!(b_board.apply_frame(&frames[0]), ApplyOutcome::Applied);
    let card = b_board.card("card-7").unwrap();
    assert_eq!(card.column_id, "col-2");
    assert_eq!(card.sequence, 3);

    // No other card changed
    for other in before.cards().filter(|c| c.id != "card-7") {
        assert_eq!(b_board.card(&other.id), Some(other));
    }

    // The acting client gets the same event
    assert_eq!(drain(&mut a_rx), frames);
}

#[tokio::test]
async fn test_pushed_state_matches_refetch() {
    let (state, auth) = setup();
    let (_b, mut b_rx) = connect(&state, &auth, "bob", "board-1");

    let mut pushed = BoardState::new("board-1");
    pushed.replace_cards(state.service().list_cards("board-1", "bob").unwrap());

    state
        .service()
        .move_card("board-1", "card-8", "col-2", 0, "alice")
        .unwrap();

    let frames = drain(&mut b_rx);
    // CARD_MOVED plus one CARD_UPDATED per shifted card
    assert_eq!(frames.len(), 3);
    for frame in &frames {
        pushed.apply_frame(frame);
    }
    // Duplicate delivery changes nothing
    let once = pushed.clone();
    for frame in &frames {
        pushed.apply_frame(frame);
    }
    assert_eq!(pushed, once);

    let mut fetched = BoardState::new("board-1");
    fetched.replace_cards(state.service().list_cards("board-1", "bob").unwrap());
    assert_eq!(pushed, fetched);
}

#[tokio::test]
async fn test_events_stay_on_their_board() {
    let (state, auth) = setup();
    let (_x, mut x_rx) = connect(&state, &auth, "alice", "board-1");
    let (_y, mut y_rx) = connect(&state, &auth, "carol", "board-2");

    state
        .service()
        .add_comment("board-1", "card-a", "On it", "bob")
        .unwrap();

    assert_eq!(drain(&mut x_rx).len(), 1);
    assert!(drain(&mut y_rx).is_empty());
}

#[tokio::test]
async fn test_closed_subscriber_does_not_break_publish() {
    let (state, auth) = setup();
    let (_a, mut a_rx) = connect(&state, &auth, "alice", "board-1");
    let (_gone, gone_rx) = connect(&state, &auth, "bob", "board-1");
    let (_c, mut c_rx) = connect(&state, &auth, "alice", "board-1");
    drop(gone_rx);

    let report = state
        .broadcaster()
        .publish(&BoardEvent::card_deleted("board-1", "card-8", "alice"));

    assert_eq!(report.delivered, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(drain(&mut a_rx).len(), 1);
    assert_eq!(drain(&mut c_rx).len(), 1);
}

#[tokio::test]
async fn test_mutation_succeeds_without_viewers() {
    let (state, _) = setup();

    state
        .service()
        .delete_card("board-1", "card-b", "bob")
        .unwrap();

    assert_eq!(state.registry().board_count(), 0);
    assert!(state.service().list_cards("board-1", "bob").unwrap().iter().all(|c| c.id != "card-b"));
}

#[test]
fn test_handshake_rejects_bad_credentials() {
    let (state, _) = setup();
    let forged = JwtAuth::new("another-secret-key-that-is-also-32-characters")
        .unwrap()
        .issue_token("alice")
        .unwrap();

    assert!(matches!(state.gateway().open(None), Err(AuthError::MissingToken)));
    assert!(matches!(
        state.gateway().open(Some("Bearer not-a-jwt")),
        Err(AuthError::TokenError(_))
    ));
    assert!(state.gateway().open(Some(forged.as_str())).is_err());
    assert_eq!(state.registry().connection_count(), 0);
}

#[test]
fn test_leave_and_switch_boards() {
    let (state, auth) = setup();
    let (mut session, mut rx) = connect(&state, &auth, "alice", "board-1");

    session.join_board("board-2");
    assert_eq!(session.state(), &ConnectionState::Subscribed("board-2".to_string()));
    assert!(!state.registry().has_board("board-1"));

    state
        .broadcaster()
        .publish(&BoardEvent::card_deleted("board-1", "card-8", "bob"));
    assert!(drain(&mut rx).is_empty());

    session.leave_board("board-2");
    assert_eq!(session.state(), &ConnectionState::Authenticated);
    assert_eq!(state.registry().board_count(), 0);
}

#[test]
fn test_disconnect_removes_every_subscription() {
    let (state, auth) = setup();
    let (session, _rx) = connect(&state, &auth, "alice", "board-1");
    let (_other, _other_rx) = connect(&state, &auth, "bob", "board-1");

    drop(session);

    assert_eq!(state.registry().subscribers_of("board-1").len(), 1);
}

#[test]
fn test_handshake_accepts_any_bearer_casing() {
    let (state, auth) = setup();
    let token = auth.issue_token("bob").unwrap();

    for credential in [format!("bearer {}", token), format!("BEARER   {}", token)] {
        let (session, _rx) = state.gateway().open(Some(credential.as_str())).unwrap();
        assert_eq!(session.connection().principal(), "bob");
    }
}

//! Board mutation endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use super::authenticate;
use crate::error::ServiceError;
use crate::realtime::AppState;
use crate::types::{Board, Card, CardPatch, Column, Comment};

/// Body of a new board
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBoard {
    #[serde(default)]
    pub name: String,
    pub workspace_id: Option<String>,
}

/// Body of a new column
#[derive(Debug, Deserialize)]
pub struct NewColumn {
    #[serde(rename = "columnName", default)]
    pub name: String,
}

/// Body of a new card
#[derive(Debug, Deserialize)]
pub struct NewCard {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Body of a card drag
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveCardRequest {
    pub column_id: String,
    pub index: usize,
}

/// Body of a column drag
#[derive(Debug, Deserialize)]
pub struct MoveColumnRequest {
    pub index: usize,
}

/// Body of a new comment
#[derive(Debug, Deserialize)]
pub struct NewComment {
    #[serde(default)]
    pub text: String,
}

/// Cards of one board
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardCards {
    pub board_id: String,
    pub cards: Vec<Card>,
}

/// POST /api/boards - Create a board
pub async fn create_board(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<NewBoard>,
) -> Result<(StatusCode, Json<Board>), ServiceError> {
    let actor = authenticate(state.verifier().as_ref(), &headers)?;
    let board = state
        .service()
        .create_board(&body.name, body.workspace_id.as_deref(), &actor)?;
    Ok((StatusCode::CREATED, Json(board)))
}

/// GET /api/boards/:board_id/columns
pub async fn list_columns(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<Column>>, ServiceError> {
    let actor = authenticate(state.verifier().as_ref(), &headers)?;
    Ok(Json(state.service().list_columns(&board_id, &actor)?))
}

/// POST /api/boards/:board_id/columns - Append a column
pub async fn create_column(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<NewColumn>,
) -> Result<(StatusCode, Json<Column>), ServiceError> {
    let actor = authenticate(state.verifier().as_ref(), &headers)?;
    let column = state.service().create_column(&board_id, &body.name, &actor)?;
    Ok((StatusCode::CREATED, Json(column)))
}

/// POST /api/boards/:board_id/columns/:column_id/cards - Append a card
pub async fn create_card(
    State(state): State<Arc<AppState>>,
    Path((board_id, column_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<NewCard>,
) -> Result<(StatusCode, Json<Card>), ServiceError> {
    let actor = authenticate(state.verifier().as_ref(), &headers)?;
    let card = state
        .service()
        .create_card(&board_id, &column_id, &body.title, &body.description, &actor)?;
    Ok((StatusCode::CREATED, Json(card)))
}

/// GET /api/boards/:board_id/cards - Cards for a full refetch
pub async fn list_cards(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<BoardCards>, ServiceError> {
    let actor = authenticate(state.verifier().as_ref(), &headers)?;
    let cards = state.service().list_cards(&board_id, &actor)?;
    Ok(Json(BoardCards { board_id, cards }))
}

/// PATCH /api/boards/:board_id/cards/:card_id - Update card fields
pub async fn update_card(
    State(state): State<Arc<AppState>>,
    Path((board_id, card_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(patch): Json<CardPatch>,
) -> Result<Json<Card>, ServiceError> {
    let actor = authenticate(state.verifier().as_ref(), &headers)?;
    let card = state.service().update_card(&board_id, &card_id, patch, &actor)?;
    Ok(Json(card))
}

/// DELETE /api/boards/:board_id/cards/:card_id - Delete a card
pub async fn delete_card(
    State(state): State<Arc<AppState>>,
    Path((board_id, card_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, ServiceError> {
    let actor = authenticate(state.verifier().as_ref(), &headers)?;
    state.service().delete_card(&board_id, &card_id, &actor)?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/boards/:board_id/cards/:card_id/move - Drag a card
pub async fn move_card(
    State(state): State<Arc<AppState>>,
    Path((board_id, card_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<MoveCardRequest>,
) -> Result<Json<Card>, ServiceError> {
    let actor = authenticate(state.verifier().as_ref(), &headers)?;
    let card = state
        .service()
        .move_card(&board_id, &card_id, &body.column_id, body.index, &actor)?;
    Ok(Json(card))
}

/// POST /api/boards/:board_id/cards/:card_id/comments - Comment on a card
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    Path((board_id, card_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<NewComment>,
) -> Result<(StatusCode, Json<Comment>), ServiceError> {
    let actor = authenticate(state.verifier().as_ref(), &headers)?;
    let comment = state
        .service()
        .add_comment(&board_id, &card_id, &body.text, &actor)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// PATCH /api/boards/:board_id/columns/:column_id/move - Drag a column
pub async fn move_column(
    State(state): State<Arc<AppState>>,
    Path((board_id, column_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<MoveColumnRequest>,
) -> Result<Json<Column>, ServiceError> {
    let actor = authenticate(state.verifier().as_ref(), &headers)?;
    let column = state
        .service()
        .reorder_column(&board_id, &column_id, body.index, &actor)?;
    Ok(Json(column))
}

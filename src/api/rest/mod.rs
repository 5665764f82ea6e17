//! REST API module for board mutations
//!
//! - `POST   /api/boards` - Create a board
//! - `GET    /api/boards/:board_id/columns` - Columns in order
//! - `POST   /api/boards/:board_id/columns` - Append a column
//! - `POST   /api/boards/:board_id/columns/:column_id/cards` - Append a card
//! - `GET    /api/boards/:board_id/cards` - Cards for a full refetch
//! - `PATCH  /api/boards/:board_id/cards/:card_id` - Update card fields
//! - `DELETE /api/boards/:board_id/cards/:card_id` - Delete a card
//! - `PATCH  /api/boards/:board_id/cards/:card_id/move` - Drag a card
//! - `POST   /api/boards/:board_id/cards/:card_id/comments` - Comment on a card
//! - `PATCH  /api/boards/:board_id/columns/:column_id/move` - Drag a column
//!
//! Every route expects `Authorization: Bearer <token>`; the scheme is case-insensitive.

pub mod boards;

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthError, AuthVerifier};
use crate::error::ServiceError;
use crate::types::PrincipalId;

/// Resolve the caller from the `Authorization` header
pub fn authenticate(verifier: &dyn AuthVerifier, headers: &HeaderMap) -> Result<PrincipalId, ServiceError> {
    let credential = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    verifier.verify(credential).map_err(|e| {
        tracing::debug!("[Auth] Rejected request credential: {}", e);
        ServiceError::Unauthorized(e)
    })
}

/// API error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    fn new(message: impl Into<String>, code: &str) -> Self {
        Self {
            error: message.into(),
            code: code.to_string(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(message, "UNAUTHORIZED")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(message, "FORBIDDEN")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, "NOT_FOUND")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, "BAD_REQUEST")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(message, "INTERNAL_ERROR")
    }
}

//! Errors surfaced by board mutations

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::ApiError;
use crate::auth::AuthError;
use crate::store::StoreError;

/// Board mutation errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AuthError),
    #[error("Access denied to board {0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let body = match &self {
            ServiceError::Unauthorized(_) => ApiError::unauthorized(message),
            ServiceError::Forbidden(_) => ApiError::forbidden(message),
            ServiceError::NotFound(_) => ApiError::not_found(message),
            ServiceError::BadRequest(_) => ApiError::bad_request(message),
            ServiceError::Store(e) => {
                tracing::error!("Store failure: {}", e);
                ApiError::internal("Internal storage error")
            }
        };
        (self.status(), Json(body)).into_response()
    }
}

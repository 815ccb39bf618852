use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{repository::RepositoryError, token::TokenError};

/// AppError
///
/// The single error taxonomy surfaced to HTTP callers. Every handler returns
/// `Result<_, AppError>`, so each failure path maps to exactly one status code.
#[derive(Debug, Error)]
pub enum AppError {
    /// No credential was presented at all.
    #[error("unauthorized access")]
    Unauthenticated,

    /// A credential was presented but the identity or role does not match.
    #[error("forbidden access: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Invalid state transition, e.g. booking an already booked listing.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("internal error")]
    Internal(#[from] RepositoryError),

    #[error("internal error")]
    TokenSigning(#[source] TokenError),
}

impl AppError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound(entity.into())
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict(reason.into())
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) | AppError::TokenSigning(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Any token that reached verification was presented, so every token failure
/// is a 403 rather than a 401.
impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(_) => AppError::TokenSigning(err),
            other => AppError::Forbidden(other.to_string()),
        }
    }
}

// Malformed bodies and query strings get the same `{ "message" }` shape as
// every other error.

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Repository details stay in the logs.
        match &self {
            AppError::Internal(source) => tracing::error!("repository failure: {:?}", source),
            AppError::TokenSigning(source) => tracing::error!("token signing failure: {:?}", source),
            _ => {}
        }

        let body = Json(json!({ "message": self.to_string() }));
        (status, body).into_response()
    }
}

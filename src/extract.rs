use axum::extract::{FromRequest, FromRequestParts, Query};

use crate::error::AppError;

/// ApiJson
///
/// `axum::Json` for request bodies, rejecting with `AppError::Validation`
/// instead of axum's plain-text response.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// ApiQuery
///
/// `axum::extract::Query`, rejecting with `AppError::Validation`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

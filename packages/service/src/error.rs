//! Application-level error type returned by handlers.
//!
//! Callers see no distinction between failures: every variant becomes
//! `500 Internal Server Error` with the plain-text body `INTERNAL ERROR`.
//! The underlying cause is logged before the response is built.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::friends::FriendError;

/// Body of every error response.
pub const ERROR_BODY: &str = "INTERNAL ERROR";

/// An error that a handler can return; converts directly to an HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Friend(#[from] FriendError),

    /// The request could not be read (bad JSON, bad query string).
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("request failed: {self}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            ERROR_BODY,
        )
            .into_response()
    }
}

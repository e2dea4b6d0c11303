//! HTTP request handlers for the friends service.
//!
//! Each submodule covers one group of endpoints. Handlers are async
//! functions that receive Axum extractors and return
//! `Result<impl IntoResponse, AppError>`; all friendship rules live in
//! [`crate::friends`], not here.

pub mod friends;
pub mod index;
pub mod users;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::{config::ServiceConfig, error::AppError, friends::FriendGraph, notification::Notifier};

/// Shared application state threaded through all Axum handlers via [`axum::extract::State`].
#[derive(Clone)]
pub struct AppState {
    pub friends: FriendGraph,
    pub config: ServiceConfig,
    /// Sink for friend events, driven by the notify middleware.
    pub notifier: Arc<dyn Notifier>,
}

/// Unwrap a JSON body, turning a rejection into an [`AppError`] so that it
/// gets the same flat error response as everything else.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

//! User node handlers.
//!
//! - `POST   /friends/insert`: create a user node.
//! - `DELETE /friends/delete`: delete a user node and every edge touching it.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use friendgraph_api::{InsertUserResponse, UserRequest};

use crate::error::AppError;

use super::{json_body, AppState};

/// `POST /friends/insert`: returns 201 with the new user's location in
/// both the `Location` header and the body.
pub async fn insert(
    State(state): State<AppState>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let req = json_body(payload)?;
    let node = state.friends.insert_user(&req.user_id).await?;
    tracing::info!(user_id = %req.user_id, "inserted {node}");

    let location = format!("/friends/{}", urlencoding::encode(&req.user_id));
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location.clone())],
        Json(InsertUserResponse {
            user_id: req.user_id,
            location,
        }),
    ))
}

/// `DELETE /friends/delete`: 204 whether or not the user existed.
pub async fn delete(
    State(state): State<AppState>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let req = json_body(payload)?;
    match state.friends.delete_user(&req.user_id).await? {
        Some(count) => tracing::info!(user_id = %req.user_id, count, "deleted user"),
        None => tracing::info!(user_id = %req.user_id, "no user to delete"),
    }
    Ok(StatusCode::NO_CONTENT)
}

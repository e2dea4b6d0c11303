//! Publishes a friend event after each successful lifecycle request.
//!
//! Matches `/friends/{user}/{op}` against the subject table in
//! [`crate::notification`]. For a match the JSON body is buffered so that
//! `friend_id` can be read, the request is passed on unchanged, and a 2xx
//! response triggers [`dispatch`]. Everything else passes straight through.

use axum::{
    body::Body,
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use friendgraph::Transition;
use friendgraph_api::{FriendEvent, FriendRequest};

use crate::error::AppError;
use crate::handlers::AppState;
use crate::notification::{dispatch, subject_for};

/// Largest request body the middleware will buffer.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Split `/friends/{user}/{op}` into the decoded user id and the transition.
pub fn parse_friend_route(path: &str) -> Option<(String, Transition)> {
    let rest = path.strip_prefix("/friends/")?;
    let (user, op) = rest.split_once('/')?;
    if user.is_empty() || op.contains('/') {
        return None;
    }
    let transition = Transition::from_route_segment(op)?;
    let user = urlencoding::decode(user).ok()?.into_owned();
    Some((user, transition))
}

fn announced(path: &str, method: &Method) -> Option<(String, &'static str)> {
    let (user, transition) = parse_friend_route(path)?;
    Some((user, subject_for(transition, method)?))
}

pub async fn notify_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some((user_id, subject)) = announced(req.uri().path(), req.method()) else {
        return next.run(req).await;
    };

    let (parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(b) => b,
        Err(e) => return AppError::BadRequest(format!("unreadable body: {e}")).into_response(),
    };
    let friend_id = serde_json::from_slice::<FriendRequest>(&bytes)
        .ok()
        .map(|r| r.friend_id);

    let response = next.run(Request::from_parts(parts, Body::from(bytes))).await;

    if response.status().is_success() {
        if let Some(friend_id) = friend_id {
            dispatch(
                state.notifier.clone(),
                subject,
                FriendEvent { user_id, friend_id },
            );
        }
    }
    response
}

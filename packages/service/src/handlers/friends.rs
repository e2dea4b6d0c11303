//! Friend list and lifecycle handlers.
//!
//! - `GET    /friends/{user}`: friends of `user`.
//! - `GET    /friends/{user}/pending`: requests `user` has received.
//! - `GET    /friends/{user}/pending_request`: requests `user` has sent.
//! - `POST   /friends/{user}/add`: send a request to `friend_id`.
//! - `DELETE /friends/{user}/cancel`: withdraw a sent request.
//! - `POST   /friends/{user}/accept`: accept a request from `friend_id`.
//! - `DELETE /friends/{user}/decline`: decline a request from `friend_id`.
//! - `DELETE /friends/{user}/delete`: end a friendship.
//! - `GET    /friends/{user}/status/{friend}`: where `friend` stands relative to `user`.
//!
//! List endpoints take `limit` and `offset`; any other query parameter is
//! echoed into the navigation links and otherwise ignored.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::{StatusCode, Uri},
    Json,
};
use friendgraph::{build_window, ListParams, Transition};
use friendgraph_api::{FriendListResponse, FriendRequest, RelationshipStatus};

use crate::error::AppError;

use super::{json_body, AppState};

type QueryPairs = Result<Query<Vec<(String, String)>>, QueryRejection>;
type FriendBody = Result<Json<FriendRequest>, JsonRejection>;

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum FriendList {
    Friends,
    Pending,
    PendingRequest,
}

async fn list(
    state: &AppState,
    kind: FriendList,
    user: &str,
    uri: &Uri,
    query: QueryPairs,
) -> Result<Json<FriendListResponse>, AppError> {
    let Query(pairs) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let params = ListParams::from_query(pairs).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let mut window = build_window(uri.path(), params, state.config.default_limit);
    let page = window.fetch_page();

    let mut friend_list = match kind {
        FriendList::Friends => state.friends.get_friends(user, page).await?,
        FriendList::Pending => state.friends.get_pending_friends(user, page).await?,
        FriendList::PendingRequest => state.friends.get_pending_friends_request(user, page).await?,
    };
    window.finish(&mut friend_list);

    Ok(Json(FriendListResponse {
        friend_list,
        links: window.links,
    }))
}

/// `GET /friends/{user}`
pub async fn list_friends(
    State(state): State<AppState>,
    Path(user): Path<String>,
    uri: Uri,
    query: QueryPairs,
) -> Result<Json<FriendListResponse>, AppError> {
    list(&state, FriendList::Friends, &user, &uri, query).await
}

/// `GET /friends/{user}/pending`
pub async fn list_pending(
    State(state): State<AppState>,
    Path(user): Path<String>,
    uri: Uri,
    query: QueryPairs,
) -> Result<Json<FriendListResponse>, AppError> {
    list(&state, FriendList::Pending, &user, &uri, query).await
}

/// `GET /friends/{user}/pending_request`
pub async fn list_pending_request(
    State(state): State<AppState>,
    Path(user): Path<String>,
    uri: Uri,
    query: QueryPairs,
) -> Result<Json<FriendListResponse>, AppError> {
    list(&state, FriendList::PendingRequest, &user, &uri, query).await
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

async fn run_transition(
    state: &AppState,
    transition: Transition,
    user: &str,
    payload: FriendBody,
) -> Result<StatusCode, AppError> {
    let req = json_body(payload)?;
    tracing::info!(user, friend = %req.friend_id, "{transition} friend");

    state
        .friends
        .transition(transition, user, &req.friend_id)
        .await?;

    Ok(match transition {
        Transition::Add | Transition::Accept => StatusCode::CREATED,
        Transition::Cancel | Transition::Decline | Transition::Remove => StatusCode::NO_CONTENT,
    })
}

/// `POST /friends/{user}/add`: 201 on success.
pub async fn add(
    State(state): State<AppState>,
    Path(user): Path<String>,
    payload: FriendBody,
) -> Result<StatusCode, AppError> {
    run_transition(&state, Transition::Add, &user, payload).await
}

/// `DELETE /friends/{user}/cancel`: 204 on success.
pub async fn cancel(
    State(state): State<AppState>,
    Path(user): Path<String>,
    payload: FriendBody,
) -> Result<StatusCode, AppError> {
    run_transition(&state, Transition::Cancel, &user, payload).await
}

/// `POST /friends/{user}/accept`: 201 on success.
pub async fn accept(
    State(state): State<AppState>,
    Path(user): Path<String>,
    payload: FriendBody,
) -> Result<StatusCode, AppError> {
    run_transition(&state, Transition::Accept, &user, payload).await
}

/// `DELETE /friends/{user}/decline`: 204 on success.
pub async fn decline(
    State(state): State<AppState>,
    Path(user): Path<String>,
    payload: FriendBody,
) -> Result<StatusCode, AppError> {
    run_transition(&state, Transition::Decline, &user, payload).await
}

/// `DELETE /friends/{user}/delete`: 204 on success.
pub async fn remove(
    State(state): State<AppState>,
    Path(user): Path<String>,
    payload: FriendBody,
) -> Result<StatusCode, AppError> {
    run_transition(&state, Transition::Remove, &user, payload).await
}

/// `GET /friends/{user}/status/{friend}`
pub async fn status(
    State(state): State<AppState>,
    Path((user, friend)): Path<(String, String)>,
) -> Result<Json<RelationshipStatus>, AppError> {
    let state_now = state.friends.relationship_state(&user, &friend).await?;
    Ok(Json(RelationshipStatus {
        user_id: user,
        friend_id: friend,
        state: state_now,
    }))
}

//! Friend-graph types: `/friends/{user}/...` endpoints.
//!
//! Mutations carry the counterparty in a [`FriendRequest`] body; reads return
//! a [`FriendListResponse`] with navigation links.

use friendgraph::{FriendState, Link};
use serde::{Deserialize, Serialize};

/// Request body for `add`, `cancel`, `accept`, `decline` and `delete` on
/// `/friends/{user}/...`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FriendRequest {
    /// `user_id` of the counterparty.
    pub friend_id: String,
}

/// One page of a friend list.
///
/// Returned by:
/// - `GET /friends/{user}`: established friends
/// - `GET /friends/{user}/pending`: users who requested `user`
/// - `GET /friends/{user}/pending_request`: users `user` has requested
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FriendListResponse {
    /// `user_id`s in this page, in creation order of the user nodes.
    pub friend_list: Vec<String>,

    /// `prev` / `self` / `next` links; `next` is absent on the last page.
    pub links: Vec<Link>,
}

/// Response body for `GET /friends/{user}/status/{friend}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelationshipStatus {
    pub user_id: String,
    pub friend_id: String,
    pub state: FriendState,
}

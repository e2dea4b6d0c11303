//! Request and response types for the friends service HTTP API.
//!
//! # Endpoints covered
//!
//! | Method | Path | Type |
//! |--------|------|------|
//! | GET | `/friends/{user}` | → [`FriendListResponse`] |
//! | GET | `/friends/{user}/pending` | → [`FriendListResponse`] |
//! | GET | `/friends/{user}/pending_request` | → [`FriendListResponse`] |
//! | GET | `/friends/{user}/status/{friend}` | → [`RelationshipStatus`] |
//! | POST | `/friends/{user}/accept` | [`FriendRequest`] → `201` |
//! | DELETE | `/friends/{user}/decline` | [`FriendRequest`] → `204` |
//! | POST | `/friends/{user}/add` | [`FriendRequest`] → `201` |
//! | DELETE | `/friends/{user}/cancel` | [`FriendRequest`] → `204` |
//! | DELETE | `/friends/{user}/delete` | [`FriendRequest`] → `204` |
//! | POST | `/friends/insert` | [`UserRequest`] → [`InsertUserResponse`] |
//! | DELETE | `/friends/delete` | [`UserRequest`] → `204` |
//! | GET | `/` | → [`EndpointIndex`] |
//!
//! Errors are `500 text/plain` and carry no body type.

pub mod event;
pub mod friend;
pub mod user;

pub use event::{EndpointIndex, EventEnvelope, FriendEvent};
pub use friend::{FriendListResponse, FriendRequest, RelationshipStatus};
pub use friendgraph::Link;
pub use user::{InsertUserResponse, UserRequest};

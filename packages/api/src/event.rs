//! Notification payloads published after successful friend mutations.

use serde::{Deserialize, Serialize};

/// The message body of every friend notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FriendEvent {
    /// The user named in the request path.
    pub user_id: String,
    /// The counterparty from the request body.
    pub friend_id: String,
}

/// What a webhook sink receives.
///
/// ```json
/// {
///   "event_id":    "019526b2-f68a-7c3e-a0b4-1d2e3f4a5b6c",
///   "subject":     "NEW FRIEND ADDED",
///   "occurred_at": "2026-02-19T14:32:00Z",
///   "message":     { "user_id": "b1", "friend_id": "a1" }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventEnvelope {
    /// UUIDv7, unique per published event.
    pub event_id: String,
    pub subject: String,
    /// RFC 3339 timestamp taken when the event was published.
    pub occurred_at: String,
    pub message: FriendEvent,
}

/// Response body for `GET /`: the route templates this service answers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointIndex {
    pub endpoints: Vec<String>,
}

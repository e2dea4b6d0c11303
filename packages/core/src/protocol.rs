//! The friend lifecycle as a state machine over directed edges.
//!
//! For an ordered pair of distinct users `(user, friend)` the graph holds one
//! of four [`FriendState`]s. Each [`Transition`] is expressed as a batch of
//! [`EdgeOp`]s; a store applies a batch atomically, and the batch's own
//! assertions (`Delete` of a missing edge, `Create`/`RequireAbsent` of an
//! existing one) are the transition's precondition check. Nothing here
//! touches a store.
//!
//! | Transition | From | Batch | To |
//! |------------|------|-------|----|
//! | `Add` | `None` | no FRIEND user→friend, no PENDING friend→user, +PENDING user→friend | `RequestSent` |
//! | `Cancel` | `RequestSent` | −PENDING user→friend | `None` |
//! | `Accept` | `RequestReceived` | −PENDING friend→user, +FRIEND both ways | `Friends` |
//! | `Decline` | `RequestReceived` | −PENDING friend→user | `None` |
//! | `Remove` | `Friends` | −FRIEND both ways | `None` |

use serde::{Deserialize, Serialize};

use crate::types::{Direction, EdgeOp, EdgeSpec, RelType};

/// Relationship state of `friend` as seen from `user`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendState {
    /// No edges between the two users.
    None,
    /// `user` has requested `friend` (PENDING_FRIEND user→friend).
    RequestSent,
    /// `friend` has requested `user` (PENDING_FRIEND friend→user).
    RequestReceived,
    /// FRIEND edges in both directions.
    Friends,
    /// A FRIEND edge without its mirror, or requests in both directions.
    /// Only writes made outside this service produce it.
    Inconsistent,
}

/// Which of the four possible edges exist between `user` and `friend`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgePresence {
    pub friend_out: bool,
    pub friend_in: bool,
    pub pending_out: bool,
    pub pending_in: bool,
}

/// Built from the edges joining `user` and `friend`, with `Outgoing`
/// meaning user→friend.
impl FromIterator<(Direction, RelType)> for EdgePresence {
    fn from_iter<I: IntoIterator<Item = (Direction, RelType)>>(edges: I) -> Self {
        let mut presence = EdgePresence::default();
        for (direction, rel_type) in edges {
            let flag = match (rel_type, direction) {
                (RelType::Friend, Direction::Outgoing) => &mut presence.friend_out,
                (RelType::Friend, Direction::Incoming) => &mut presence.friend_in,
                (RelType::PendingFriend, Direction::Outgoing) => &mut presence.pending_out,
                (RelType::PendingFriend, Direction::Incoming) => &mut presence.pending_in,
            };
            *flag = true;
        }
        presence
    }
}

impl FriendState {
    pub fn classify(edges: EdgePresence) -> Self {
        match edges {
            EdgePresence {
                friend_out: true,
                friend_in: true,
                ..
            } => FriendState::Friends,
            EdgePresence {
                friend_out: true, ..
            }
            | EdgePresence { friend_in: true, .. } => FriendState::Inconsistent,
            EdgePresence {
                pending_out: true,
                pending_in: true,
                ..
            } => FriendState::Inconsistent,
            EdgePresence {
                pending_out: true, ..
            } => FriendState::RequestSent,
            EdgePresence {
                pending_in: true, ..
            } => FriendState::RequestReceived,
            _ => FriendState::None,
        }
    }

    /// The state `transition` leads to, or `None` when it is not allowed
    /// from `self`.
    pub fn after(self, transition: Transition) -> Option<FriendState> {
        (self == transition.precondition()).then(|| transition.outcome())
    }
}

/// A friend lifecycle operation initiated by `user` towards `friend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Add,
    Cancel,
    Accept,
    Decline,
    Remove,
}

impl Transition {
    pub const ALL: [Transition; 5] = [
        Transition::Add,
        Transition::Cancel,
        Transition::Accept,
        Transition::Decline,
        Transition::Remove,
    ];

    /// The trailing path segment of the operation's route
    /// (`/friends/{user}/{segment}`).
    pub fn route_segment(&self) -> &'static str {
        match self {
            Transition::Add => "add",
            Transition::Cancel => "cancel",
            Transition::Accept => "accept",
            Transition::Decline => "decline",
            Transition::Remove => "delete",
        }
    }

    pub fn from_route_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.route_segment() == segment)
    }

    pub fn precondition(&self) -> FriendState {
        match self {
            Transition::Add => FriendState::None,
            Transition::Cancel => FriendState::RequestSent,
            Transition::Accept | Transition::Decline => FriendState::RequestReceived,
            Transition::Remove => FriendState::Friends,
        }
    }

    pub fn outcome(&self) -> FriendState {
        match self {
            Transition::Add => FriendState::RequestSent,
            Transition::Accept => FriendState::Friends,
            Transition::Cancel | Transition::Decline | Transition::Remove => FriendState::None,
        }
    }

    /// The write batch that performs this transition.
    ///
    /// Consuming ops come first so that a failed precondition is reported as
    /// the missing edge rather than as a conflict on a created one.
    pub fn edge_ops(&self, user: &str, friend: &str) -> Vec<EdgeOp> {
        let edge = |from: &str, to: &str, rel| EdgeSpec::between_users(from, to, rel);
        match self {
            Transition::Add => vec![
                EdgeOp::RequireAbsent(edge(user, friend, RelType::Friend)),
                EdgeOp::RequireAbsent(edge(friend, user, RelType::PendingFriend)),
                EdgeOp::Create(edge(user, friend, RelType::PendingFriend)),
            ],
            Transition::Cancel => vec![EdgeOp::Delete(edge(user, friend, RelType::PendingFriend))],
            Transition::Accept => vec![
                EdgeOp::Delete(edge(friend, user, RelType::PendingFriend)),
                EdgeOp::Create(edge(user, friend, RelType::Friend)),
                EdgeOp::Create(edge(friend, user, RelType::Friend)),
            ],
            Transition::Decline => {
                vec![EdgeOp::Delete(edge(friend, user, RelType::PendingFriend))]
            }
            Transition::Remove => vec![
                EdgeOp::Delete(edge(user, friend, RelType::Friend)),
                EdgeOp::Delete(edge(friend, user, RelType::Friend)),
            ],
        }
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.route_segment())
    }
}

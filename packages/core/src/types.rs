//! Core data types for the friend graph.
//!
//! This module defines the graph vocabulary shared by every layer:
//! [`Node`], [`Edge`], [`RelType`], [`Direction`], [`NodeTemplate`] and the
//! batched write description [`EdgeOp`]. Nothing here performs I/O.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Label carried by every user node.
pub const USER_LABEL: &str = "user";

/// Property that identifies a user node. Unique per label.
pub const USER_ID_KEY: &str = "user_id";

/// Exact-match property map. Ordered so that templates render and compare
/// deterministically.
pub type Properties = BTreeMap<String, String>;

/// Store-assigned node identifier. Monotonic in creation order.
pub type NodeId = i64;

/// The two relationship types the service manages.
///
/// Serialises as the upper-case graph type name (e.g. `"PENDING_FRIEND"`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelType {
    /// One half of an established friendship. Always paired with its mirror.
    Friend,
    /// An outstanding request from the edge source to the edge target.
    PendingFriend,
}

impl RelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelType::Friend => "FRIEND",
            RelType::PendingFriend => "PENDING_FRIEND",
        }
    }
}

impl fmt::Display for RelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a [`RelType`] from its graph type name.
impl std::str::FromStr for RelType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FRIEND" => Ok(RelType::Friend),
            "PENDING_FRIEND" => Ok(RelType::PendingFriend),
            _ => Err(format!(
                "unknown relationship type {s:?}; expected FRIEND or PENDING_FRIEND"
            )),
        }
    }
}

/// Which end of an edge a traversal starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Follow edges whose source is the anchor node.
    Outgoing,
    /// Follow edges whose target is the anchor node.
    Incoming,
}

/// A label + exact-match property filter used to locate nodes.
///
/// Templates are ephemeral; they are never persisted. A template with neither
/// a label nor a property is rejected by [`crate::validate_template`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub properties: Properties,
}

impl NodeTemplate {
    /// A template matching every node carrying `label`.
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            properties: Properties::new(),
        }
    }

    /// The template that selects the user node for `user_id`.
    pub fn user(user_id: &str) -> Self {
        Self::labelled(USER_LABEL).with_property(USER_ID_KEY, user_id)
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// True when the template carries neither a label nor a property.
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.properties.is_empty()
    }
}

/// Renders as a graph pattern, e.g. `(:user {user_id: "alice"})`.
impl fmt::Display for NodeTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        if let Some(label) = &self.label {
            write!(f, ":{label}")?;
        }
        write_properties(f, &self.properties)?;
        f.write_str(")")
    }
}

/// A stored graph vertex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub properties: Properties,
}

impl Node {
    /// The node's `user_id` property, if it has one.
    pub fn user_id(&self) -> Option<&str> {
        self.properties.get(USER_ID_KEY).map(String::as_str)
    }

    /// True when the node satisfies every constraint in `template`.
    pub fn matches(&self, template: &NodeTemplate) -> bool {
        if let Some(label) = &template.label {
            if &self.label != label {
                return false;
            }
        }
        template
            .properties
            .iter()
            .all(|(k, v)| self.properties.get(k) == Some(v))
    }
}

/// Opaque textual form handed back by traversal reads.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(:{}", self.label)?;
        write_properties(f, &self.properties)?;
        f.write_str(")")
    }
}

fn write_properties(f: &mut fmt::Formatter<'_>, properties: &Properties) -> fmt::Result {
    if properties.is_empty() {
        return Ok(());
    }
    f.write_str(" {")?;
    for (i, (k, v)) in properties.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{k}: {v:?}")?;
    }
    f.write_str("}")
}

/// A stored, typed, directed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub rel_type: RelType,
}

/// An edge addressed by the templates of its endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeSpec {
    pub from: NodeTemplate,
    pub to: NodeTemplate,
    pub rel_type: RelType,
}

impl EdgeSpec {
    pub fn new(from: NodeTemplate, to: NodeTemplate, rel_type: RelType) -> Self {
        Self { from, to, rel_type }
    }

    /// The edge between two user nodes.
    pub fn between_users(from: &str, to: &str, rel_type: RelType) -> Self {
        Self::new(NodeTemplate::user(from), NodeTemplate::user(to), rel_type)
    }
}

impl fmt::Display for EdgeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-[:{}]->{}", self.from, self.rel_type, self.to)
    }
}

/// One step of a write batch. A store applies a batch all-or-nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeOp {
    /// Create the edge. Fails if it already exists.
    Create(EdgeSpec),
    /// Delete the edge. Fails if it does not exist.
    Delete(EdgeSpec),
    /// Assert the edge does not exist; writes nothing.
    RequireAbsent(EdgeSpec),
}

impl EdgeOp {
    pub fn spec(&self) -> &EdgeSpec {
        match self {
            EdgeOp::Create(s) | EdgeOp::Delete(s) | EdgeOp::RequireAbsent(s) => s,
        }
    }
}

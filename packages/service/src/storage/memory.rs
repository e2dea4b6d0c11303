//! In-memory graph store.
//!
//! All data is held in RAM behind a [`RwLock`] and is lost when the process
//! exits. Use this for tests, the conformance suite, and ephemeral
//! deployments.
//!
//! Nodes live in a [`BTreeMap`] keyed by their monotonic id, so every scan
//! is already in creation order. Edges live in a [`BTreeSet`]; the set
//! itself is the `(source, target, rel_type)` uniqueness constraint.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use friendgraph::{
    validate_label, validate_template, Direction, Edge, EdgeOp, Node, NodeId, NodeTemplate, Page,
    Properties, RelType, USER_ID_KEY,
};

use super::{exactly_one, GraphError, GraphStore};

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Inner {
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeSet<Edge>,
    last_id: NodeId,
}

impl Inner {
    fn matching(&self, template: &NodeTemplate) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.matches(template))
            .map(|n| n.id)
            .collect()
    }

    fn resolve(&self, template: &NodeTemplate) -> Result<NodeId, GraphError> {
        validate_template(template)?;
        exactly_one(template, self.matching(template))
    }

    /// Apply `ops` in order, logging each edge change to `undo`. Stops at the
    /// first failing op; the caller reverts what was logged.
    fn apply_ops(&mut self, ops: &[EdgeOp], undo: &mut Vec<Undo>) -> Result<Vec<Edge>, GraphError> {
        let mut created = Vec::new();

        for op in ops {
            let spec = op.spec();
            let edge = Edge {
                source: self.resolve(&spec.from)?,
                target: self.resolve(&spec.to)?,
                rel_type: spec.rel_type,
            };
            match op {
                EdgeOp::Create(_) => {
                    if !self.edges.insert(edge) {
                        return Err(GraphError::edge_exists(spec));
                    }
                    undo.push(Undo::Inserted(edge));
                    created.push(edge);
                }
                EdgeOp::Delete(_) => {
                    if !self.edges.remove(&edge) {
                        return Err(GraphError::edge_not_found(spec));
                    }
                    undo.push(Undo::Removed(edge));
                }
                EdgeOp::RequireAbsent(_) => {
                    if self.edges.contains(&edge) {
                        return Err(GraphError::edge_exists(spec));
                    }
                }
            }
        }

        Ok(created)
    }

    fn revert(&mut self, step: Undo) {
        match step {
            Undo::Inserted(edge) => self.edges.remove(&edge),
            Undo::Removed(edge) => self.edges.insert(edge),
        };
    }
}

/// One applied edge change, recorded so a failed batch can be rolled back.
enum Undo {
    Inserted(Edge),
    Removed(Edge),
}

/// The `(label, user_id)` key a node occupies, if it has a `user_id`.
fn unique_key(label: &str, properties: &Properties) -> Option<(String, String)> {
    properties
        .get(USER_ID_KEY)
        .map(|id| (label.to_string(), id.clone()))
}

fn duplicate(label: &str, user_id: &str) -> GraphError {
    GraphError::DuplicateNode(NodeTemplate::labelled(label).with_property(USER_ID_KEY, user_id).to_string())
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Thread-safe, in-memory implementation of [`GraphStore`].
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored edges. Handy for asserting that a failed batch left
    /// nothing behind.
    pub fn edge_count(&self) -> usize {
        self.read().edges.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// GraphStore impl
// ---------------------------------------------------------------------------

#[async_trait]
impl GraphStore for MemoryStore {
    // --- Nodes ---------------------------------------------------------------

    async fn find_nodes(&self, template: &NodeTemplate) -> Result<Vec<Node>, GraphError> {
        validate_template(template)?;
        let inner = self.read();
        Ok(inner
            .nodes
            .values()
            .filter(|n| n.matches(template))
            .cloned()
            .collect())
    }

    async fn create_node(&self, label: &str, properties: &Properties) -> Result<Node, GraphError> {
        validate_label(label)?;
        let mut inner = self.write();

        if let Some((label, user_id)) = unique_key(label, properties) {
            let taken = inner
                .nodes
                .values()
                .any(|n| n.label == label && n.user_id() == Some(user_id.as_str()));
            if taken {
                return Err(duplicate(&label, &user_id));
            }
        }

        inner.last_id += 1;
        let node = Node {
            id: inner.last_id,
            label: label.to_string(),
            properties: properties.clone(),
        };
        inner.nodes.insert(node.id, node.clone());
        Ok(node)
    }

    async fn update_node(
        &self,
        template: &NodeTemplate,
        changes: &Properties,
    ) -> Result<Vec<Node>, GraphError> {
        validate_template(template)?;
        let mut inner = self.write();

        let updated: Vec<Node> = inner
            .nodes
            .values()
            .filter(|n| n.matches(template))
            .map(|n| {
                let mut n = n.clone();
                n.properties
                    .extend(changes.iter().map(|(k, v)| (k.clone(), v.clone())));
                n
            })
            .collect();

        // Check the uniqueness constraint against the post-update graph.
        let updated_ids: HashSet<NodeId> = updated.iter().map(|n| n.id).collect();
        let mut keys = HashSet::new();
        let after = inner
            .nodes
            .values()
            .filter(|n| !updated_ids.contains(&n.id))
            .chain(updated.iter());
        for node in after {
            if let Some(key) = unique_key(&node.label, &node.properties) {
                if !keys.insert(key.clone()) {
                    return Err(duplicate(&key.0, &key.1));
                }
            }
        }

        for node in &updated {
            inner.nodes.insert(node.id, node.clone());
        }
        Ok(updated)
    }

    async fn delete_nodes(&self, template: &NodeTemplate) -> Result<Option<usize>, GraphError> {
        validate_template(template)?;
        let mut inner = self.write();

        let doomed: HashSet<NodeId> = inner.matching(template).into_iter().collect();
        if doomed.is_empty() {
            return Ok(None);
        }
        inner.nodes.retain(|id, _| !doomed.contains(id));
        inner
            .edges
            .retain(|e| !doomed.contains(&e.source) && !doomed.contains(&e.target));
        Ok(Some(doomed.len()))
    }

    // --- Edges ---------------------------------------------------------------

    async fn apply(&self, ops: &[EdgeOp]) -> Result<Vec<Edge>, GraphError> {
        let mut inner = self.write();
        let mut undo = Vec::new();
        match inner.apply_ops(ops, &mut undo) {
            Ok(created) => Ok(created),
            Err(e) => {
                for step in undo.into_iter().rev() {
                    inner.revert(step);
                }
                Err(e)
            }
        }
    }

    async fn edges_between(
        &self,
        a: &NodeTemplate,
        b: &NodeTemplate,
    ) -> Result<Vec<(Direction, RelType)>, GraphError> {
        let inner = self.read();
        let (a, b) = (inner.resolve(a)?, inner.resolve(b)?);
        Ok(inner
            .edges
            .iter()
            .filter_map(|e| match (e.source, e.target) {
                (s, t) if s == a && t == b => Some((Direction::Outgoing, e.rel_type)),
                (s, t) if s == b && t == a => Some((Direction::Incoming, e.rel_type)),
                _ => None,
            })
            .collect())
    }

    async fn neighbors(
        &self,
        template: &NodeTemplate,
        rel_type: RelType,
        direction: Direction,
        page: Page,
    ) -> Result<Vec<Node>, GraphError> {
        validate_template(template)?;
        let inner = self.read();

        let anchors: HashSet<NodeId> = inner.matching(template).into_iter().collect();
        let reached: BTreeSet<NodeId> = inner
            .edges
            .iter()
            .filter(|e| e.rel_type == rel_type)
            .filter_map(|e| match direction {
                Direction::Outgoing if anchors.contains(&e.source) => Some(e.target),
                Direction::Incoming if anchors.contains(&e.target) => Some(e.source),
                _ => None,
            })
            .collect();

        Ok(reached
            .into_iter()
            .filter_map(|id| inner.nodes.get(&id))
            .skip(page.offset)
            .take(page.limit)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Graph store abstraction for the friends service.
//!
//! The [`GraphStore`] trait is the narrow query interface between the friend
//! operations and the graph engine: template node matches, single-hop
//! traversals, and single-edge writes grouped into transactional batches.
//! All lifecycle rules live in [`crate::friends`]; storage knows nothing
//! about friendship.
//!
//! # Implementations
//!
//! | Type | When to use |
//! |------|-------------|
//! | [`MemoryStore`] | Tests, conformance suite, ephemeral deployments |
//! | [`SqliteStore`] | Production; durable single-file database |
//!
//! [`MemoryStore`]: memory::MemoryStore
//! [`SqliteStore`]: sqlite::SqliteStore

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use friendgraph::{
    Direction, Edge, EdgeOp, EdgeSpec, Node, NodeTemplate, Page, Properties, RelType,
    TemplateError,
};

// ---------------------------------------------------------------------------
// GraphError
// ---------------------------------------------------------------------------

/// Errors that graph store operations can return.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The template cannot be executed (empty, or a non-identifier name).
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] TemplateError),

    /// A write needed exactly one node and the template matched none.
    #[error("no node matches {0}")]
    NodeNotFound(String),

    /// A write needed exactly one node and the template matched several.
    #[error("{count} nodes match {template}, expected exactly one")]
    AmbiguousNode { template: String, count: usize },

    /// The edge a `Delete` targets does not exist.
    #[error("edge not found: {0}")]
    EdgeNotFound(String),

    /// A `Create` or `RequireAbsent` found the edge already present.
    #[error("edge already exists: {0}")]
    EdgeExists(String),

    /// A node with the same label and `user_id` already exists.
    #[error("node already exists: {0}")]
    DuplicateNode(String),

    /// The backend failed; the transaction was rolled back.
    #[error("store operation failed: {0}")]
    StoreOperationFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl GraphError {
    pub(crate) fn failed(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        GraphError::StoreOperationFailed(Box::new(e))
    }

    pub(crate) fn edge_not_found(spec: &EdgeSpec) -> Self {
        GraphError::EdgeNotFound(spec.to_string())
    }

    pub(crate) fn edge_exists(spec: &EdgeSpec) -> Self {
        GraphError::EdgeExists(spec.to_string())
    }
}

/// Pick the single node a write addresses out of a template's matches.
pub(crate) fn exactly_one<T>(template: &NodeTemplate, mut matches: Vec<T>) -> Result<T, GraphError> {
    match matches.len() {
        0 => Err(GraphError::NodeNotFound(template.to_string())),
        1 => Ok(matches.remove(0)),
        count => Err(GraphError::AmbiguousNode {
            template: template.to_string(),
            count,
        }),
    }
}

// ---------------------------------------------------------------------------
// GraphStore trait
// ---------------------------------------------------------------------------

/// The persistence contract for the friend graph.
///
/// All methods are `async` and return `Result<_, GraphError>`.
/// Implementations must be `Send + Sync + 'static` so they can be held in an
/// `Arc<dyn GraphStore>` and shared by every request. Each write method is
/// its own transaction; concurrent callers rely on the backend's isolation.
#[async_trait]
pub trait GraphStore: Send + Sync + 'static {
    // --- Nodes ---------------------------------------------------------------

    /// Return every node matching `template`, ordered by node id.
    ///
    /// Fails with [`GraphError::InvalidQuery`] if the template has neither a
    /// label nor a property.
    async fn find_nodes(&self, template: &NodeTemplate) -> Result<Vec<Node>, GraphError>;

    /// Create and commit a node. Fails with [`GraphError::DuplicateNode`] if
    /// a node with the same label and `user_id` exists.
    async fn create_node(&self, label: &str, properties: &Properties) -> Result<Node, GraphError>;

    /// Merge `changes` into the properties of every node matching
    /// `template`, in one transaction. Returns the updated nodes.
    async fn update_node(
        &self,
        template: &NodeTemplate,
        changes: &Properties,
    ) -> Result<Vec<Node>, GraphError>;

    /// Delete every node matching `template` together with all edges
    /// touching them, in one transaction.
    ///
    /// Returns the number of nodes removed, or `None` when nothing matched.
    async fn delete_nodes(&self, template: &NodeTemplate) -> Result<Option<usize>, GraphError>;

    // --- Edges ---------------------------------------------------------------

    /// Apply a batch of edge operations in a single transaction.
    ///
    /// Every template in the batch must resolve to exactly one node. If any
    /// op fails the whole batch is rolled back and its error returned.
    /// Returns the edges created by `Create` ops, in batch order.
    async fn apply(&self, ops: &[EdgeOp]) -> Result<Vec<Edge>, GraphError>;

    /// Every edge joining the nodes `a` and `b` resolve to, in either
    /// direction, read in one consistent snapshot. `Outgoing` means the edge
    /// runs from `a` to `b`.
    async fn edges_between(
        &self,
        a: &NodeTemplate,
        b: &NodeTemplate,
    ) -> Result<Vec<(Direction, RelType)>, GraphError>;

    /// Single-hop traversal: the nodes one `rel_type` edge away from any node
    /// matching `template`, in `direction`, ordered by node id and cut to
    /// `page`. A template matching nothing yields an empty list.
    async fn neighbors(
        &self,
        template: &NodeTemplate,
        rel_type: RelType,
        direction: Direction,
        page: Page,
    ) -> Result<Vec<Node>, GraphError>;

    // --- Single-edge helpers -------------------------------------------------

    /// Create one directed edge and commit.
    async fn create_relationship(
        &self,
        from: &NodeTemplate,
        to: &NodeTemplate,
        rel_type: RelType,
    ) -> Result<Edge, GraphError> {
        let spec = EdgeSpec::new(from.clone(), to.clone(), rel_type);
        let mut created = self.apply(&[EdgeOp::Create(spec)]).await?;
        created
            .pop()
            .ok_or_else(|| GraphError::failed(std::io::Error::other("batch created no edge")))
    }

    /// Delete one directed edge and commit.
    async fn delete_relationship(
        &self,
        from: &NodeTemplate,
        to: &NodeTemplate,
        rel_type: RelType,
    ) -> Result<(), GraphError> {
        let spec = EdgeSpec::new(from.clone(), to.clone(), rel_type);
        self.apply(&[EdgeOp::Delete(spec)]).await?;
        Ok(())
    }
}

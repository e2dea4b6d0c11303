//! Domain core of the friends service.
//!
//! This crate holds everything about the friend graph that can be decided
//! without a database or an HTTP stack: the node/edge vocabulary, template
//! validation, the friend lifecycle and the edges each step writes, and the
//! pagination window with its navigation links. The `friendgraph-service`
//! crate executes these against a graph store.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`types`] | [`Node`], [`Edge`], [`RelType`], [`NodeTemplate`], [`EdgeOp`] |
//! | [`validation`] | Template checks via [`validate_template`] |
//! | [`protocol`] | [`FriendState`] and the [`Transition`] edge batches |
//! | [`pagination`] | [`build_window`] and [`Link`] generation |
//!
//! # Quick start
//!
//! ```rust
//! use friendgraph::{Transition, EdgeOp};
//!
//! // Accepting b1's request on behalf of a1 writes three edge ops.
//! let ops = Transition::Accept.edge_ops("a1", "b1");
//! assert!(matches!(ops[0], EdgeOp::Delete(_)));
//! assert_eq!(ops.len(), 3);
//! ```

pub mod pagination;
pub mod protocol;
pub mod types;
pub mod validation;

pub use pagination::{build_window, Link, ListParams, Page, PaginationError, Window, DEFAULT_LIMIT};
pub use protocol::{EdgePresence, FriendState, Transition};
pub use types::{
    Direction, Edge, EdgeOp, EdgeSpec, Node, NodeId, NodeTemplate, Properties, RelType, USER_ID_KEY,
    USER_LABEL,
};
pub use validation::{validate_label, validate_template, TemplateError};

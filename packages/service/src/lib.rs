//! Public surface for the `friendgraph-service` crate.
//!
//! Exposes the router builder, stores and config types so that external
//! crates (e.g. the conformance test suite) can spin up an in-process
//! service without spawning a subprocess.

pub mod config;
pub mod error;
pub mod friends;
pub mod handlers;
pub mod middleware;
pub mod notification;
pub mod router;
pub mod storage;

pub use config::ServiceConfig;
pub use friends::{FriendError, FriendGraph};
pub use notification::{LogNotifier, Notifier, NotifyError, WebhookNotifier};
pub use router::build_router;
pub use storage::{memory::MemoryStore, sqlite::SqliteStore, GraphError, GraphStore};

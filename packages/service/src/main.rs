//! `friends-service`: social-graph friends API.
//!
//! # Quick start
//!
//! ```sh
//! # In-memory store on the default port:
//! friends-service
//!
//! # Persistent SQLite store, webhook notifications:
//! FRIENDS_DB=./friends.db FRIENDS_NOTIFY_URL=http://sink/events friends-service
//! ```
//!
//! # Environment variables
//!
//! See [`ServiceConfig`] for the full list.

use std::sync::Arc;

use friendgraph_service::{
    build_router, GraphStore, LogNotifier, MemoryStore, Notifier, ServiceConfig, SqliteStore,
    WebhookNotifier,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "friendgraph_service=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = ServiceConfig::from_env().unwrap_or_else(|e| panic!("invalid configuration: {e}"));

    let store: Arc<dyn GraphStore> = match &config.db_path {
        Some(path) => {
            tracing::info!("storage: SQLite at {path}");
            Arc::new(
                SqliteStore::open(path)
                    .unwrap_or_else(|e| panic!("failed to open SQLite database at {path}: {e}")),
            )
        }
        None => {
            tracing::info!("storage: in-memory (data will not survive restart)");
            Arc::new(MemoryStore::new())
        }
    };

    let notifier: Arc<dyn Notifier> = match &config.notify_url {
        Some(url) => {
            tracing::info!("notifications: webhook at {url}");
            Arc::new(
                WebhookNotifier::new(url.as_str())
                    .unwrap_or_else(|e| panic!("failed to build webhook client: {e}")),
            )
        }
        None => {
            tracing::info!("notifications: log only");
            Arc::new(LogNotifier)
        }
    };

    let bind_addr = config.bind_addr;
    let app = build_router(store, config, notifier);

    tracing::info!("listening on {bind_addr}");
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {bind_addr}: {e}"));

    axum::serve(listener, app).await.expect("server error");
}

//! Shared helpers for the friends service conformance test suite.
//!
//! Provides [`spawn_service`], a function that binds a `TcpListener` on an
//! ephemeral port, wires up an in-process service backed by `MemoryStore`,
//! and returns the local URL together with handles on the store and on
//! every notification the service publishes.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use friendgraph_api::FriendEvent;
use friendgraph_service::{
    build_router, GraphStore, MemoryStore, Notifier, NotifyError, ServiceConfig,
};

/// A [`Notifier`] that keeps every published `(subject, event)` in memory.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(String, FriendEvent)>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<(String, FriendEvent)> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Poll until at least `count` events have arrived or `timeout` passes,
    /// then return what was recorded. Publishing happens on a background
    /// task, so it can trail the HTTP response.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<(String, FriendEvent)> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let events = self.events();
            if events.len() >= count || tokio::time::Instant::now() >= deadline {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, subject: &str, event: &FriendEvent) -> Result<(), NotifyError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((subject.to_string(), event.clone()));
        Ok(())
    }
}

/// Handles on a running in-process service.
pub struct TestService {
    /// e.g. `http://127.0.0.1:51234`
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestService {
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Start an ephemeral in-process service.
///
/// The service runs in a background `tokio` task and is bound to an
/// OS-assigned port on `127.0.0.1`. The returned store is the one the
/// service uses, so tests can seed or inspect the graph directly.
///
/// # Panics
///
/// Panics if the TCP listener cannot be bound or the service fails to start.
pub async fn spawn_service() -> TestService {
    spawn_service_with(ServiceConfig::default()).await
}

/// Like [`spawn_service`], with a caller-supplied config (the bind address
/// is overridden).
pub async fn spawn_service_with(mut config: ServiceConfig) -> TestService {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("get local addr");
    config.bind_addr = addr;

    let mem_store = Arc::new(MemoryStore::new());
    let store: Arc<dyn GraphStore> = Arc::clone(&mem_store) as Arc<dyn GraphStore>;
    let notifier = Arc::new(RecordingNotifier::default());
    let router = build_router(store, config, Arc::clone(&notifier) as Arc<dyn Notifier>);

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("conformance service error");
    });

    TestService {
        base_url: format!("http://{addr}"),
        store: mem_store,
        notifier,
    }
}

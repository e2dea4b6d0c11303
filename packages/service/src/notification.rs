//! Outbound notifications for completed friend operations.
//!
//! After a successful mutation the service publishes a [`FriendEvent`] under
//! an operation-specific subject. Publishing is fire-and-forget: it runs on
//! its own task, and a failure is logged and dropped.
//!
//! | Operation | Method | Subject |
//! |-----------|--------|---------|
//! | `add` | POST | `NEW FRIEND REQUEST ADDED` |
//! | `accept` | POST | `NEW FRIEND ADDED` |
//! | `decline` | DELETE | `A FRIEND REQUEST IS DECLINED` |
//! | `cancel` | DELETE | `A FRIEND REQUEST IS CANCELLED` |
//! | `delete` | DELETE | `A FRIEND IS DELETED` |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::Method;
use chrono::{SecondsFormat, Utc};
use friendgraph::Transition;
use friendgraph_api::{EventEnvelope, FriendEvent};

/// Request timeout for webhook deliveries.
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook answered {0}")]
    Rejected(reqwest::StatusCode),
}

/// A pub/sub sink for friend events.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn publish(&self, subject: &str, event: &FriendEvent) -> Result<(), NotifyError>;
}

/// The subject published for `transition` when reached via `method`, or
/// `None` if that combination is not announced.
pub fn subject_for(transition: Transition, method: &Method) -> Option<&'static str> {
    match (transition, method) {
        (Transition::Add, &Method::POST) => Some("NEW FRIEND REQUEST ADDED"),
        (Transition::Accept, &Method::POST) => Some("NEW FRIEND ADDED"),
        (Transition::Decline, &Method::DELETE) => Some("A FRIEND REQUEST IS DECLINED"),
        (Transition::Cancel, &Method::DELETE) => Some("A FRIEND REQUEST IS CANCELLED"),
        (Transition::Remove, &Method::DELETE) => Some("A FRIEND IS DELETED"),
        _ => None,
    }
}

/// Wrap `event` for delivery, stamping a fresh id and the current time.
pub fn envelope(subject: &str, event: &FriendEvent) -> EventEnvelope {
    EventEnvelope {
        event_id: uuid::Uuid::now_v7().to_string(),
        subject: subject.to_string(),
        occurred_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        message: event.clone(),
    }
}

/// Publish on a background task. The caller never waits and never sees the
/// outcome.
pub fn dispatch(notifier: Arc<dyn Notifier>, subject: &'static str, event: FriendEvent) {
    tokio::spawn(async move {
        if let Err(e) = notifier.publish(subject, &event).await {
            tracing::warn!(
                subject,
                user_id = %event.user_id,
                friend_id = %event.friend_id,
                "notification dropped: {e}"
            );
        }
    });
}

// ---------------------------------------------------------------------------
// LogNotifier
// ---------------------------------------------------------------------------

/// Writes each event to the log. Used when no sink URL is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn publish(&self, subject: &str, event: &FriendEvent) -> Result<(), NotifyError> {
        tracing::info!(
            subject,
            user_id = %event.user_id,
            friend_id = %event.friend_id,
            "friend event"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// WebhookNotifier
// ---------------------------------------------------------------------------

/// POSTs an [`EventEnvelope`] as JSON to a fixed URL.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn publish(&self, subject: &str, event: &FriendEvent) -> Result<(), NotifyError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&envelope(subject, event))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(NotifyError::Rejected(resp.status()));
        }
        tracing::debug!(subject, url = %self.url, "event delivered");
        Ok(())
    }
}

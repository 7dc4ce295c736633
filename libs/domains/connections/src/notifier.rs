//! Best-effort delivery of connection events.
//!
//! The service hands events to [`Notifier::notify`] only after the state change
//! has been stored. Delivery happens on a background task that drains a bounded
//! queue into a [`NotificationSink`]; a full queue or a failed delivery is logged
//! and counted, never reported back to the request.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_config::{ConfigError, FromEnv, env_optional, env_parse};
use observability::ConnectionMetrics;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use strum::Display;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ConnectionError, ConnectionResult};
use crate::models::{ConnectionRequest, ConnectionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionEventKind {
    Requested,
    Accepted,
    Declined,
    Withdrawn,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionEvent {
    pub kind: ConnectionEventKind,
    /// User the notification is addressed to
    pub recipient_id: Uuid,
    pub request: ConnectionRequest,
    pub occurred_at: DateTime<Utc>,
}

impl ConnectionEvent {
    /// Event describing the current state of `request`, addressed to the other party.
    pub fn from_request(request: &ConnectionRequest) -> Self {
        let (kind, recipient_id) = match request.status {
            ConnectionStatus::Pending => (ConnectionEventKind::Requested, request.target_id),
            ConnectionStatus::Accepted => (ConnectionEventKind::Accepted, request.requester_id),
            ConnectionStatus::Declined => (ConnectionEventKind::Declined, request.requester_id),
            ConnectionStatus::Withdrawn => (ConnectionEventKind::Withdrawn, request.target_id),
        };
        Self {
            kind,
            recipient_id,
            request: request.clone(),
            occurred_at: Utc::now(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(&self, event: &ConnectionEvent) -> ConnectionResult<()>;
}

/// Writes events to the log. Used when no webhook is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

#[async_trait]
impl NotificationSink for TracingSink {
    fn name(&self) -> &'static str {
        "tracing"
    }

    async fn deliver(&self, event: &ConnectionEvent) -> ConnectionResult<()> {
        info!(
            event = %event.kind,
            recipient_id = %event.recipient_id,
            request_id = %event.request.id,
            "Connection notification"
        );
        Ok(())
    }
}

/// POSTs each event as JSON to a fixed URL.
pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> ConnectionResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConnectionError::Internal(format!("Failed to build webhook client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(&self, event: &ConnectionEvent) -> ConnectionResult<()> {
        self.client
            .post(&self.url)
            .json(event)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ConnectionError::Delivery(e.to_string()))?;
        debug!(request_id = %event.request.id, "Webhook delivered");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub webhook_url: Option<String>,
    pub webhook_timeout: Duration,
    pub queue_capacity: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            webhook_timeout: Duration::from_secs(5),
            queue_capacity: 1024,
        }
    }
}

impl NotifierConfig {
    /// Webhook sink when a URL is configured, tracing sink otherwise.
    pub fn sink(&self) -> ConnectionResult<Arc<dyn NotificationSink>> {
        Ok(match &self.webhook_url {
            Some(url) => Arc::new(WebhookSink::new(url.clone(), self.webhook_timeout)?),
            None => Arc::new(TracingSink),
        })
    }
}

impl FromEnv for NotifierConfig {
    /// - NOTIFY_WEBHOOK_URL (optional)
    /// - NOTIFY_WEBHOOK_TIMEOUT_MS (default 5000)
    /// - NOTIFY_QUEUE_CAPACITY (default 1024, at least 1)
    fn from_env() -> Result<Self, ConfigError> {
        let queue_capacity = env_parse("NOTIFY_QUEUE_CAPACITY", 1024usize)?;
        if queue_capacity == 0 {
            return Err(ConfigError::ParseError {
                key: "NOTIFY_QUEUE_CAPACITY".to_string(),
                details: "must be at least 1".to_string(),
            });
        }
        Ok(Self {
            webhook_url: env_optional("NOTIFY_WEBHOOK_URL"),
            webhook_timeout: Duration::from_millis(env_parse("NOTIFY_WEBHOOK_TIMEOUT_MS", 5000u64)?),
            queue_capacity,
        })
    }
}

/// Handle for enqueueing events; cheap to clone.
///
/// The delivery task exits once every handle is dropped and the queue is drained.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::Sender<ConnectionEvent>,
}

impl Notifier {
    pub fn spawn(sink: Arc<dyn NotificationSink>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(deliver_events(sink, rx));
        (Self { tx }, handle)
    }

    pub fn notify(&self, event: ConnectionEvent) {
        let kind = event.kind;
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(
                    event = %kind,
                    request_id = %event.request.id,
                    "Notification queue full, dropping event"
                );
                ConnectionMetrics::record_notification(&kind.to_string(), "dropped");
            }
            Err(TrySendError::Closed(event)) => {
                warn!(
                    event = %kind,
                    request_id = %event.request.id,
                    "Notification worker stopped, dropping event"
                );
                ConnectionMetrics::record_notification(&kind.to_string(), "dropped");
            }
        }
    }
}

async fn deliver_events(sink: Arc<dyn NotificationSink>, mut rx: mpsc::Receiver<ConnectionEvent>) {
    info!(sink = sink.name(), "Notification worker started");
    while let Some(event) = rx.recv().await {
        let kind = event.kind.to_string();
        match sink.deliver(&event).await {
            Ok(()) => ConnectionMetrics::record_notification(&kind, "delivered"),
            Err(e) => {
                warn!(
                    sink = sink.name(),
                    event = %kind,
                    request_id = %event.request.id,
                    error = %e,
                    "Notification delivery failed"
                );
                ConnectionMetrics::record_notification(&kind, "failed");
            }
        }
    }
    info!(sink = sink.name(), "Notification worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateConnectionRequest;
    use std::sync::Mutex;

    fn pending() -> ConnectionRequest {
        ConnectionRequest::new(
            Uuid::now_v7(),
            CreateConnectionRequest {
                target_id: Uuid::now_v7(),
                message: String::new(),
                job_id: None,
            },
        )
    }

    #[test]
    fn test_event_recipient_is_the_other_party() {
        let mut request = pending();
        let event = ConnectionEvent::from_request(&request);
        assert_eq!(event.kind, ConnectionEventKind::Requested);
        assert_eq!(event.recipient_id, request.target_id);

        request.status = ConnectionStatus::Accepted;
        let event = ConnectionEvent::from_request(&request);
        assert_eq!(event.kind, ConnectionEventKind::Accepted);
        assert_eq!(event.recipient_id, request.requester_id);

        request.status = ConnectionStatus::Withdrawn;
        assert_eq!(
            ConnectionEvent::from_request(&request).recipient_id,
            request.target_id
        );
    }

    #[derive(Default)]
    struct Recording(Mutex<Vec<ConnectionEventKind>>);

    #[async_trait]
    impl NotificationSink for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn deliver(&self, event: &ConnectionEvent) -> ConnectionResult<()> {
            self.0.lock().unwrap().push(event.kind);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_worker_drains_queue_before_exit() {
        let sink = Arc::new(Recording::default());
        let (notifier, handle) = Notifier::spawn(sink.clone(), 8);

        let mut request = pending();
        notifier.notify(ConnectionEvent::from_request(&request));
        request.status = ConnectionStatus::Declined;
        notifier.notify(ConnectionEvent::from_request(&request));
        drop(notifier);

        handle.await.unwrap();
        assert_eq!(
            *sink.0.lock().unwrap(),
            vec![ConnectionEventKind::Requested, ConnectionEventKind::Declined]
        );
    }

    #[tokio::test]
    async fn test_failed_delivery_does_not_stop_worker() {
        let mut sink = MockNotificationSink::new();
        sink.expect_name().return_const("mock");
        let mut calls = 0;
        sink.expect_deliver().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(ConnectionError::Delivery("502".to_string()))
            } else {
                Ok(())
            }
        });

        let (notifier, handle) = Notifier::spawn(Arc::new(sink), 4);
        notifier.notify(ConnectionEvent::from_request(&pending()));
        notifier.notify(ConnectionEvent::from_request(&pending()));
        drop(notifier);
        handle.await.unwrap();
    }

    #[test]
    fn test_config_defaults_and_validation() {
        temp_env::with_vars_unset(["NOTIFY_WEBHOOK_URL", "NOTIFY_QUEUE_CAPACITY"], || {
            let config = NotifierConfig::from_env().unwrap();
            assert!(config.webhook_url.is_none());
            assert_eq!(config.queue_capacity, 1024);
        });
        temp_env::with_var("NOTIFY_QUEUE_CAPACITY", Some("0"), || {
            assert!(NotifierConfig::from_env().is_err());
        });
    }
}

//! Domain events and the notification worker.
//!
//! The engine never talks to push or email transports. It publishes
//! [`DomainEvent`]s on a channel after releasing the store lock; a
//! [`NotificationWorker`] task drains the channel and hands each recipient's
//! message to a [`NotificationSink`]. Sink failures are logged and counted,
//! never retried and never reported back to the operation that caused them.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use storekeeper_core::{ListingId, Locale, StoreId, UserId};

use super::messages::{self, MessageKey};
use crate::models::ExpirationNotification;

/// Something that happened to a store that users may want to hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    /// An expiration notice was emitted for the owner.
    ExpirationNotice(ExpirationNotification),
    /// A store published a new listing.
    ListingPublished {
        store_id: StoreId,
        store_name: String,
        listing_id: ListingId,
        follower_ids: Vec<UserId>,
    },
    /// A store was deleted by its owner.
    StoreClosed {
        store_id: StoreId,
        store_name: String,
        follower_ids: Vec<UserId>,
    },
}

impl DomainEvent {
    /// Short name for logs and metrics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ExpirationNotice(_) => "expiration_notice",
            Self::ListingPublished { .. } => "listing_published",
            Self::StoreClosed { .. } => "store_closed",
        }
    }

    /// Store the event is about.
    #[must_use]
    pub const fn store_id(&self) -> StoreId {
        match self {
            Self::ExpirationNotice(notification) => notification.store_id,
            Self::ListingPublished { store_id, .. } | Self::StoreClosed { store_id, .. } => {
                *store_id
            }
        }
    }
}

/// A single message for a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub recipient: UserId,
    pub store_id: StoreId,
    /// Event name, see [`DomainEvent::name`].
    pub topic: &'static str,
    pub message: String,
}

/// Errors a sink may report.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The transport rejected or failed the delivery.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Push/email transport, implemented outside the engine.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one message. Timeouts and cancellation are the sink's concern.
    async fn dispatch(&self, dispatch: &Dispatch) -> Result<(), SinkError>;
}

/// Sink that only writes deliveries to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

#[async_trait]
impl NotificationSink for TracingSink {
    async fn dispatch(&self, dispatch: &Dispatch) -> Result<(), SinkError> {
        info!(
            recipient = %dispatch.recipient,
            store_id = %dispatch.store_id,
            topic = dispatch.topic,
            message = %dispatch.message,
            "Notification"
        );
        Ok(())
    }
}

/// Sending half of the event channel, held by the engine.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: mpsc::UnboundedSender<DomainEvent>,
}

/// Receiving half of the event channel, consumed by the worker.
#[derive(Debug)]
pub struct EventReceiver {
    receiver: mpsc::UnboundedReceiver<DomainEvent>,
}

/// Create a connected publisher/receiver pair.
#[must_use]
pub fn event_channel() -> (EventPublisher, EventReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (EventPublisher { sender }, EventReceiver { receiver })
}

impl EventPublisher {
    /// Publish an event. Never blocks and never fails the caller.
    pub fn publish(&self, event: DomainEvent) {
        let name = event.name();
        let store_id = event.store_id();
        if self.sender.send(event).is_err() {
            counter!("storekeeper.events.dropped").increment(1);
            warn!(event = name, store_id = %store_id, "Event worker gone, dropping event");
        } else {
            debug!(event = name, store_id = %store_id, "Published event");
        }
    }
}

impl EventReceiver {
    /// Receive the next event, or `None` once every publisher is dropped.
    pub async fn recv(&mut self) -> Option<DomainEvent> {
        self.receiver.recv().await
    }

    /// Take the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<DomainEvent> {
        self.receiver.try_recv().ok()
    }
}

/// Background task delivering events through a sink.
pub struct NotificationWorker {
    receiver: EventReceiver,
    sink: Arc<dyn NotificationSink>,
    locale: Locale,
}

impl NotificationWorker {
    /// Create a worker.
    #[must_use]
    pub fn new(receiver: EventReceiver, sink: Arc<dyn NotificationSink>, locale: Locale) -> Self {
        Self {
            receiver,
            sink,
            locale,
        }
    }

    /// Spawn the worker on the current Tokio runtime.
    ///
    /// The task ends once every [`EventPublisher`] has been dropped and the
    /// channel is drained.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        info!("Spawning notification worker");
        tokio::spawn(self.run())
    }

    /// Process events until the channel closes.
    pub async fn run(mut self) {
        while let Some(event) = self.receiver.recv().await {
            self.handle(&event).await;
        }
        info!("Notification worker stopped");
    }

    #[instrument(skip(self, event), fields(event = event.name(), store_id = %event.store_id()))]
    async fn handle(&self, event: &DomainEvent) {
        for dispatch in self.dispatches(event) {
            match self.sink.dispatch(&dispatch).await {
                Ok(()) => {
                    counter!("storekeeper.notifications.dispatched").increment(1);
                }
                Err(e) => {
                    counter!("storekeeper.notifications.failed").increment(1);
                    warn!(
                        error = %e,
                        recipient = %dispatch.recipient,
                        "Notification dispatch failed"
                    );
                }
            }
        }
    }

    /// Fan an event out to per-recipient messages.
    fn dispatches(&self, event: &DomainEvent) -> Vec<Dispatch> {
        let topic = event.name();
        match event {
            DomainEvent::ExpirationNotice(notification) => vec![Dispatch {
                recipient: notification.owner_id,
                store_id: notification.store_id,
                topic,
                message: notification.message.clone(),
            }],
            DomainEvent::ListingPublished {
                store_id,
                store_name,
                follower_ids,
                ..
            } => self.fan_out(*store_id, topic, follower_ids, || {
                messages::render(MessageKey::ListingPublished, self.locale, store_name, 0)
            }),
            DomainEvent::StoreClosed {
                store_id,
                store_name,
                follower_ids,
            } => self.fan_out(*store_id, topic, follower_ids, || {
                messages::render(MessageKey::StoreClosed, self.locale, store_name, 0)
            }),
        }
    }

    fn fan_out(
        &self,
        store_id: StoreId,
        topic: &'static str,
        recipients: &[UserId],
        message: impl Fn() -> String,
    ) -> Vec<Dispatch> {
        if recipients.is_empty() {
            debug!(store_id = %store_id, topic, "No followers to notify");
        }
        recipients
            .iter()
            .map(|recipient| Dispatch {
                recipient: *recipient,
                store_id,
                topic,
                message: message(),
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use storekeeper_core::{NotificationId, NotificationKind};
    use tokio::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<Dispatch>>,
        fail_for: Option<UserId>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn dispatch(&self, dispatch: &Dispatch) -> Result<(), SinkError> {
            if self.fail_for == Some(dispatch.recipient) {
                return Err(SinkError::Delivery("mailbox full".to_string()));
            }
            self.delivered.lock().await.push(dispatch.clone());
            Ok(())
        }
    }

    fn listing_event(followers: Vec<UserId>) -> DomainEvent {
        DomainEvent::ListingPublished {
            store_id: StoreId::new(1),
            store_name: "Casa Verde".to_string(),
            listing_id: ListingId::new(10),
            follower_ids: followers,
        }
    }

    #[tokio::test]
    async fn test_worker_fans_out_to_followers() {
        let (publisher, receiver) = event_channel();
        let sink = Arc::new(RecordingSink::default());
        let handle = NotificationWorker::new(receiver, sink.clone(), Locale::En).spawn();

        publisher.publish(listing_event(vec![UserId::new(2), UserId::new(3)]));
        drop(publisher);
        handle.await.unwrap();

        let delivered = sink.delivered.lock().await;
        assert_eq!(delivered.len(), 2);
        assert_eq!(delivered[0].recipient, UserId::new(2));
        assert_eq!(delivered[0].topic, "listing_published");
        assert_eq!(delivered[0].message, "\"Casa Verde\" just published a new listing.");
    }

    #[tokio::test]
    async fn test_worker_survives_sink_failures() {
        let (publisher, receiver) = event_channel();
        let sink = Arc::new(RecordingSink {
            delivered: Mutex::new(Vec::new()),
            fail_for: Some(UserId::new(2)),
        });
        let handle = NotificationWorker::new(receiver, sink.clone(), Locale::En).spawn();

        publisher.publish(listing_event(vec![UserId::new(2), UserId::new(3)]));
        publisher.publish(DomainEvent::StoreClosed {
            store_id: StoreId::new(1),
            store_name: "Casa Verde".to_string(),
            follower_ids: vec![UserId::new(3)],
        });
        drop(publisher);
        handle.await.unwrap();

        let delivered = sink.delivered.lock().await;
        let topics: Vec<&str> = delivered.iter().map(|d| d.topic).collect();
        assert_eq!(topics, vec!["listing_published", "store_closed"]);
    }

    #[tokio::test]
    async fn test_expiration_notice_goes_to_owner() {
        let (publisher, receiver) = event_channel();
        let sink = Arc::new(RecordingSink::default());
        let handle = NotificationWorker::new(receiver, sink.clone(), Locale::Es).spawn();

        publisher.publish(DomainEvent::ExpirationNotice(ExpirationNotification {
            id: NotificationId::generate(),
            store_id: StoreId::new(4),
            owner_id: UserId::new(8),
            kind: NotificationKind::Deactivated,
            created_at: Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            read: false,
            message: "already rendered".to_string(),
        }));
        drop(publisher);
        handle.await.unwrap();

        let delivered = sink.delivered.lock().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].recipient, UserId::new(8));
        assert_eq!(delivered[0].message, "already rendered");
    }

    #[test]
    fn test_publish_after_worker_gone_does_not_panic() {
        let (publisher, receiver) = event_channel();
        drop(receiver);
        publisher.publish(listing_event(vec![UserId::new(2)]));
    }
}

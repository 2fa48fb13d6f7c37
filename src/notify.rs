use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;
use ulid::Ulid;

use crate::engine::Intent;
use crate::observability;

const CHANNEL_CAPACITY: usize = 256;

pub type DeliveryError = Box<dyn std::error::Error + Send + Sync>;

/// Broadcast hub for per-booking intent streams. UI surfaces subscribe to a
/// booking; intents published after each transition fan out to them.
pub struct IntentHub {
    channels: DashMap<Ulid, broadcast::Sender<Intent>>,
}

impl IntentHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to intents for a booking. Creates the channel if needed.
    pub fn subscribe(&self, booking_id: Ulid) -> broadcast::Receiver<Intent> {
        let sender = self
            .channels
            .entry(booking_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Publish one intent. No-op if nobody is listening.
    pub fn send(&self, intent: &Intent) {
        metrics::counter!(
            observability::INTENTS_PUBLISHED_TOTAL,
            "intent" => observability::intent_label(intent)
        )
        .increment(1);
        if let Some(sender) = self.channels.get(&intent.booking_id()) {
            let _ = sender.send(intent.clone());
        }
    }

    pub fn publish(&self, intents: &[Intent]) {
        for intent in intents {
            self.send(intent);
        }
    }

    /// Remove a channel (e.g. once a booking reaches a terminal state).
    pub fn remove(&self, booking_id: &Ulid) {
        self.channels.remove(booking_id);
    }
}

impl Default for IntentHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Delivery side of the notification collaborator (email/SMS gateway).
#[async_trait]
pub trait IntentSink: Send + Sync {
    async fn deliver(&self, intent: &Intent) -> Result<(), DeliveryError>;
}

/// Deliver every intent through the sink. Failures are logged and counted,
/// never propagated — a failed send must not roll back the transition that
/// produced it.
pub async fn deliver_all(sink: &dyn IntentSink, intents: &[Intent]) {
    for intent in intents {
        match sink.deliver(intent).await {
            Ok(()) => {
                tracing::debug!(
                    booking_id = %intent.booking_id(),
                    intent = observability::intent_label(intent),
                    "intent delivered"
                );
            }
            Err(e) => {
                metrics::counter!(observability::INTENT_DELIVERY_FAILURES_TOTAL).increment(1);
                tracing::warn!(
                    booking_id = %intent.booking_id(),
                    intent = observability::intent_label(intent),
                    "intent delivery failed: {e}"
                );
            }
        }
    }
}

/// Sink that renders intents as JSON log lines. Stands in for a real
/// gateway in development and tests.
pub struct LoggingSink;

#[async_trait]
impl IntentSink for LoggingSink {
    async fn deliver(&self, intent: &Intent) -> Result<(), DeliveryError> {
        let payload = serde_json::to_string(intent)?;
        tracing::info!(target: "tutorbook::notify", payload, "intent");
        Ok(())
    }
}

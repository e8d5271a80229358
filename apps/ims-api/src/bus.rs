//! Live notification bus.
//!
//! One process-wide broadcast channel carrying cache-invalidation hints:
//! each message names an entity that changed, never its contents. Ids are
//! strictly increasing; a subscriber that falls behind the channel capacity
//! is disconnected and must reconnect and re-fetch.

use domain_incidents::Notification;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

/// One message on the bus.
#[derive(Debug, Clone)]
pub struct BusEvent {
    pub id: u64,
    pub kind: &'static str,
    pub data: serde_json::Value,
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BusEvent>,
    counter: Arc<AtomicU64>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            counter: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Publish notifications for one event. Call only after the transaction
    /// that produced them has committed.
    pub fn publish(&self, event_name: &str, notifications: &[Notification]) {
        for notification in notifications {
            let (kind, data) = match notification {
                Notification::Incident { number, .. } => (
                    "Incident",
                    json!({ "event_id": event_name, "incident_number": number }),
                ),
                Notification::FieldReport { number, .. } => (
                    "FieldReport",
                    json!({ "event_id": event_name, "field_report_number": number }),
                ),
                Notification::Stay { number, .. } => (
                    "Stay",
                    json!({ "event_id": event_name, "stay_number": number }),
                ),
            };
            let id = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            // No subscribers is fine.
            let _ = self.sender.send(BusEvent { id, kind, data });
        }
    }

    /// Subscribe, returning a synthetic `InitialEvent` carrying the current
    /// counter so the client knows where the stream starts.
    pub fn subscribe(&self) -> (BusEvent, broadcast::Receiver<BusEvent>) {
        let receiver = self.sender.subscribe();
        let initial = BusEvent {
            id: self.counter.load(Ordering::SeqCst),
            kind: "InitialEvent",
            data: json!({ "initial_event": true }),
        };
        (initial, receiver)
    }
}

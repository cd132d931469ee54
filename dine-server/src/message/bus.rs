//! Realtime fan-out bus
//!
//! Two broadcast channels with different guarantees:
//!
//! - changes: pushed after every committed insert/update on order, table,
//!   session, and complaint records. Deltas carry the entity id only;
//!   subscribers re-fetch the current row, which keeps them correct under
//!   duplicate delivery and missed intermediate updates.
//! - ephemeral: fire-and-forget events ("call waiter", "cash requested").
//!   Not persisted, not replayed; an offline subscriber misses them.
//!
//! Subscribers filter by `restaurant_id` themselves; the bus is a single
//! process-wide fan-out, not a per-tenant topic tree.

use shared::message::{ChangeEvent, ChangeKind, ChangedEntity, EphemeralEvent, EphemeralKind};
use shared::util::now_millis;
use tokio::sync::broadcast;
use tracing::debug;

/// Broadcast channel capacity
const CHANNEL_CAPACITY: usize = 4096;

/// Process-wide fan-out bus
#[derive(Debug, Clone)]
pub struct MessageBus {
    change_tx: broadcast::Sender<ChangeEvent>,
    ephemeral_tx: broadcast::Sender<EphemeralEvent>,
}

impl MessageBus {
    pub fn new() -> Self {
        let (change_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (ephemeral_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            change_tx,
            ephemeral_tx,
        }
    }

    /// Publish a committed change
    ///
    /// Dropped silently when nobody is subscribed; the change stream is a
    /// notification layer, the store remains the source of truth.
    pub fn publish_change(
        &self,
        restaurant_id: &str,
        entity: ChangedEntity,
        id: &str,
        change: ChangeKind,
    ) {
        let event = ChangeEvent {
            restaurant_id: restaurant_id.to_string(),
            entity,
            id: id.to_string(),
            change,
            at: now_millis(),
        };
        debug!(restaurant_id, %entity, id, ?change, "publishing change");
        let _ = self.change_tx.send(event);
    }

    /// Publish a fire-and-forget event
    pub fn publish_ephemeral(&self, restaurant_id: &str, payload: EphemeralKind) {
        let event = EphemeralEvent {
            restaurant_id: restaurant_id.to_string(),
            payload,
            at: now_millis(),
        };
        let _ = self.ephemeral_tx.send(event);
    }

    pub fn subscribe_changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.change_tx.subscribe()
    }

    pub fn subscribe_ephemeral(&self) -> broadcast::Receiver<EphemeralEvent> {
        self.ephemeral_tx.subscribe()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

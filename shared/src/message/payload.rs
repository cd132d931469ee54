//! Realtime fan-out payloads
//!
//! Two channels with different guarantees:
//!
//! - [`ChangeEvent`]: durable change stream. Every committed insert/update
//!   to an order, table, or session record is pushed to subscribers
//!   filtered by restaurant id. The payload is a minimal delta; consumers
//!   are expected to re-fetch the affected row's full current state
//!   rather than applying the delta, which keeps them correct under
//!   duplicate delivery and missed intermediate updates.
//! - [`EphemeralEvent`]: fire-and-forget broadcast. No persistence, no
//!   replay. A subscriber that is offline when the event fires never
//!   receives it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which persisted record kind a change event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedEntity {
    Order,
    Table,
    Session,
    Complaint,
}

impl fmt::Display for ChangedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Order => write!(f, "order"),
            Self::Table => write!(f, "table"),
            Self::Session => write!(f, "session"),
            Self::Complaint => write!(f, "complaint"),
        }
    }
}

/// The kind of change that happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
}

/// Durable change stream event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub restaurant_id: String,
    pub entity: ChangedEntity,
    /// Id of the changed row; subscribers re-fetch by this id
    pub id: String,
    pub change: ChangeKind,
    pub at: i64,
}

/// Ephemeral broadcast event kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EphemeralKind {
    /// Customer pressed "call waiter" at a table
    CallWaiter { table_number: String },
    /// Customer asked to settle an order in cash
    CashRequested { order_id: String, amount: f64 },
}

/// Fire-and-forget broadcast event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EphemeralEvent {
    pub restaurant_id: String,
    #[serde(flatten)]
    pub payload: EphemeralKind,
    pub at: i64,
}

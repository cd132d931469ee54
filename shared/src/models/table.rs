//! Dining table and table session models

use serde::{Deserialize, Serialize};

/// Table occupancy status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    #[default]
    Available,
    Occupied,
}

/// A physical dining table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiningTable {
    pub id: String,
    pub restaurant_id: String,
    pub table_number: String,
    pub status: TableStatus,
    /// Stamped when the table becomes occupied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booked_at: Option<i64>,
}

/// Session lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Active,
    Closed,
}

/// A table session: the binding between a physical table and the orders
/// placed while it is occupied.
///
/// Invariant: at most one `Active` session per table at any time. The
/// storage layer enforces this with a uniqueness constraint on the
/// active-session index, so racing creators converge on one session id
/// (first-writer-wins).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableSession {
    pub id: String,
    pub table_id: String,
    pub restaurant_id: String,
    pub status: SessionStatus,
    pub booked_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<i64>,
}

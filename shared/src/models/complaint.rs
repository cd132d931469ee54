//! Customer/staff complaint model
//!
//! A complaint is tied 1:1 to an order but has an independent lifecycle:
//! resolving a complaint never touches order state, and order transitions
//! never touch the complaint.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    #[default]
    Open,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Complaint {
    pub id: String,
    pub order_id: String,
    pub restaurant_id: String,
    pub description: String,
    pub status: ComplaintStatus,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<i64>,
}

//! Payment ledger entry
//!
//! One row per settled payment leg. Refunds update the ledger row and the
//! order record inside the same storage transaction; an order marked paid
//! without a matching ledger row is an auditing gap and is surfaced as
//! `PartialReconciliation`, never silently accepted.

use serde::{Deserialize, Serialize};

/// A recorded payment against an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentEntry {
    pub payment_id: String,
    pub order_id: String,
    pub restaurant_id: String,
    /// "cash" or the gateway provider name
    pub method: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_order_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_payment_id: Option<String>,
    /// True when this entry is one leg of a split settlement
    #[serde(default)]
    pub split_part: bool,
    /// Cumulative amount refunded against this entry
    #[serde(default)]
    pub refunded_amount: f64,
    pub created_at: i64,
}

//! Order aggregate and its embedded line items
//!
//! The order is the central aggregate: line items are an owned ordered
//! list embedded in the order, addressed by `menu_item_id` (a stable
//! per-item key), never by array index. The order-level status is derived
//! from item statuses by the reducer in `dine-server`; only
//! `pending_payment` and `cancelled` are set independently.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    #[default]
    DineIn,
    Takeaway,
    Delivery,
}

/// Order-level lifecycle status
///
/// `Received`..`Served` are derivable from item statuses; `PendingPayment`
/// and `Cancelled` bypass the derivation and are only set by the explicit
/// payment and cancel operations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    PendingPayment,
    Received,
    Preparing,
    Ready,
    Served,
    Cancelled,
}

impl OrderStatus {
    /// Terminal states: no further lifecycle transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Served | Self::Cancelled)
    }
}

/// Per-line-item lifecycle stage, distinct from the order's own status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Queued,
    Received,
    Preparing,
    Ready,
    Served,
}

/// Payment settlement status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    PartiallyRefunded,
    Refunded,
    Failed,
}

/// How the order is (to be) paid
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "provider")]
pub enum PaymentMethod {
    Cash,
    /// Online payment through a named gateway provider
    Online(String),
    /// Cash + online legs settled together
    Split,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        Self::Cash
    }
}

/// A line item embedded in an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    /// Stable per-item key within this order (menu item id)
    pub menu_item_id: String,
    /// Name snapshot at order time
    pub name: String,
    /// Unit price snapshot at order time
    pub price: f64,
    pub quantity: i32,
    pub is_veg: bool,
    pub item_status: ItemStatus,
    /// Stamped once when the item enters Preparing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
    /// Stamped once when the item enters Ready
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_at: Option<i64>,
    /// Stamped once when the item enters Served
    #[serde(skip_serializing_if = "Option::is_none")]
    pub served_at: Option<i64>,
}

impl OrderItem {
    /// Line total for this item
    pub fn line_total(&self) -> Decimal {
        Decimal::try_from(self.price).unwrap_or_default() * Decimal::from(self.quantity)
    }
}

/// Discount kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Percentage,
    Fixed,
}

/// The single active discount on an order
///
/// Re-applying a discount replaces this record rather than stacking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscountRecord {
    pub kind: DiscountKind,
    pub value: f64,
    pub amount: f64,
    pub reason: String,
    pub applied_at: i64,
}

/// Split payment breakdown (cash leg + online leg)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SplitBreakdown {
    pub cash_amount: f64,
    pub online_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_payment_id: Option<String>,
}

/// Customer contact info captured at checkout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CustomerInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// The order aggregate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Opaque id
    pub id: String,
    pub restaurant_id: String,
    /// Human-facing sequential number (per restaurant)
    pub order_number: u64,
    /// Unguessable token for customer-facing links
    pub order_token: String,

    pub order_type: OrderType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(default)]
    pub customer: CustomerInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,

    pub items: Vec<OrderItem>,

    // === Financials ===
    pub subtotal: f64,
    pub discount_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<DiscountRecord>,
    pub tax: f64,
    pub total: f64,

    // === Payment ===
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitBreakdown>,
    pub refund_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refunded_at: Option<i64>,

    // === Lifecycle ===
    pub order_status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,

    /// Optimistic concurrency counter, bumped on every persisted write
    pub version: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Find an item by its stable key
    pub fn item(&self, menu_item_id: &str) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.menu_item_id == menu_item_id)
    }

    /// Find an item mutably by its stable key
    pub fn item_mut(&mut self, menu_item_id: &str) -> Option<&mut OrderItem> {
        self.items
            .iter_mut()
            .find(|i| i.menu_item_id == menu_item_id)
    }

    /// Check the financial invariant: total == subtotal - discount + tax
    ///
    /// Compared in decimal space so float noise in the stored f64s does
    /// not produce false violations.
    pub fn totals_consistent(&self) -> bool {
        let subtotal = Decimal::try_from(self.subtotal).unwrap_or_default();
        let discount = Decimal::try_from(self.discount_amount).unwrap_or_default();
        let tax = Decimal::try_from(self.tax).unwrap_or_default();
        let total = Decimal::try_from(self.total).unwrap_or_default();
        let tolerance = Decimal::new(1, 2); // 0.01
        (subtotal - discount + tax - total).abs() <= tolerance
    }
}

//! Command action implementations
//!
//! Each action implements the `CommandHandler` trait and handles one
//! specific command type. Actions run inside the write transaction held
//! by the manager: they load the aggregate, validate, mutate, and return
//! the updated order. The manager owns persistence, version bumping, and
//! the post-commit broadcast.

use redb::WriteTransaction;
use shared::models::Order;
use thiserror::Error;

use crate::orders::storage::{OrderStorage, StorageError};

mod apply_discount;
mod cancel_order;
mod confirm_cash_payment;
mod create_order;
mod mark_paid;
mod refund;
mod settle_split;
mod update_item_status;

pub use apply_discount::ApplyDiscountAction;
pub use cancel_order::CancelOrderAction;
pub use confirm_cash_payment::ConfirmCashPaymentAction;
pub use create_order::{CreateOrderAction, OrderItemInput};
pub use mark_paid::MarkPaidAction;
pub use refund::RefundAction;
pub use settle_split::SettleSplitAction;
pub use update_item_status::UpdateItemStatusAction;

/// Domain-level errors raised by command execution
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Item not found in order: {0}")]
    ItemNotFound(String),

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Order is already cancelled")]
    AlreadyCancelled,

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Discount amount {amount} exceeds order total {original_total}")]
    DiscountExceedsTotal { amount: f64, original_total: f64 },

    #[error("Refund amount {requested} exceeds refundable {refundable}")]
    RefundExceedsPaid { requested: f64, refundable: f64 },

    #[error("Split amounts {cash} + {online} do not match order total {total}")]
    SplitMismatch { cash: f64, online: f64, total: f64 },

    #[error("Payment records do not reconcile: {0}")]
    PartialReconciliation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Per-command metadata supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct CommandMetadata {
    /// Client-generated id for duplicate suppression
    pub command_id: Option<String>,
    /// Version the caller last observed; mismatch aborts the command
    pub expected_version: Option<u64>,
}

/// Execution context handed to actions by the manager
///
/// Holds the open write transaction, so every read and write an action
/// performs lands in the same atomic unit.
pub struct CommandContext<'a> {
    pub txn: &'a WriteTransaction,
    pub storage: &'a OrderStorage,
    pub now: i64,
    /// Non-fatal sub-step failure the caller should see alongside the
    /// committed result (e.g. the refund leg of a cancel)
    pub warning: Option<String>,
}

impl<'a> CommandContext<'a> {
    pub fn new(txn: &'a WriteTransaction, storage: &'a OrderStorage, now: i64) -> Self {
        Self {
            txn,
            storage,
            now,
            warning: None,
        }
    }

    /// Load the order aggregate or fail with `OrderNotFound`
    pub fn load_order(&self, order_id: &str) -> Result<Order, OrderError> {
        self.storage
            .get_order_txn(self.txn, order_id)?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))
    }
}

/// A single order command
///
/// Implementations mutate the aggregate and may append ledger rows via
/// the context; they never commit or broadcast themselves.
pub trait CommandHandler {
    fn execute(&self, ctx: &mut CommandContext<'_>) -> Result<Order, OrderError>;
}

/// CommandAction enum - dispatches to concrete action implementations
pub enum CommandAction {
    CreateOrder(CreateOrderAction),
    MarkPaid(MarkPaidAction),
    ConfirmCashPayment(ConfirmCashPaymentAction),
    SettleSplit(SettleSplitAction),
    UpdateItemStatus(UpdateItemStatusAction),
    CancelOrder(CancelOrderAction),
    ApplyDiscount(ApplyDiscountAction),
    Refund(RefundAction),
}

impl CommandHandler for CommandAction {
    fn execute(&self, ctx: &mut CommandContext<'_>) -> Result<Order, OrderError> {
        match self {
            CommandAction::CreateOrder(action) => action.execute(ctx),
            CommandAction::MarkPaid(action) => action.execute(ctx),
            CommandAction::ConfirmCashPayment(action) => action.execute(ctx),
            CommandAction::SettleSplit(action) => action.execute(ctx),
            CommandAction::UpdateItemStatus(action) => action.execute(ctx),
            CommandAction::CancelOrder(action) => action.execute(ctx),
            CommandAction::ApplyDiscount(action) => action.execute(ctx),
            CommandAction::Refund(action) => action.execute(ctx),
        }
    }
}

impl CommandAction {
    /// Human-readable name for logging
    pub fn name(&self) -> &'static str {
        match self {
            CommandAction::CreateOrder(_) => "create_order",
            CommandAction::MarkPaid(_) => "mark_paid",
            CommandAction::ConfirmCashPayment(_) => "confirm_cash_payment",
            CommandAction::SettleSplit(_) => "settle_split",
            CommandAction::UpdateItemStatus(_) => "update_item_status",
            CommandAction::CancelOrder(_) => "cancel_order",
            CommandAction::ApplyDiscount(_) => "apply_discount",
            CommandAction::Refund(_) => "refund",
        }
    }
}

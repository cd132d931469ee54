//! MarkPaid action - flip an order to paid after gateway verification
//!
//! This is the only code path that produces `payment_status = paid` for
//! an online order. Checkout initiation never persists anything; only a
//! verified payment reaches this action. The ledger row is written in the
//! same transaction as the order update.

use shared::models::{ItemStatus, Order, OrderStatus, PaymentEntry, PaymentStatus};
use uuid::Uuid;

use super::{CommandContext, CommandHandler, OrderError};
use crate::orders::money;

pub struct MarkPaidAction {
    pub order_id: String,
    /// Gateway provider name, e.g. "razorpay"
    pub provider: String,
    pub amount: f64,
    pub provider_order_ref: String,
    pub provider_payment_id: String,
}

impl CommandHandler for MarkPaidAction {
    fn execute(&self, ctx: &mut CommandContext<'_>) -> Result<Order, OrderError> {
        money::validate_amount(self.amount, "payment amount")?;
        let mut order = ctx.load_order(&self.order_id)?;

        match order.payment_status {
            PaymentStatus::Pending | PaymentStatus::Failed => {}
            other => {
                return Err(OrderError::InvalidTransition {
                    from: format!("{:?}", other).to_lowercase(),
                    to: "paid".to_string(),
                });
            }
        }
        if order.order_status == OrderStatus::Cancelled {
            return Err(OrderError::AlreadyCancelled);
        }
        if !money::money_eq(self.amount, order.total) {
            return Err(OrderError::InvalidOperation(format!(
                "verified amount {} does not match order total {}",
                self.amount, order.total
            )));
        }

        order.payment_status = PaymentStatus::Paid;
        if order.order_status == OrderStatus::PendingPayment {
            order.order_status = OrderStatus::Received;
            for item in &mut order.items {
                if item.item_status == ItemStatus::Queued {
                    item.item_status = ItemStatus::Received;
                }
            }
        }

        let entry = PaymentEntry {
            payment_id: Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            restaurant_id: order.restaurant_id.clone(),
            method: self.provider.clone(),
            amount: self.amount,
            provider_order_ref: Some(self.provider_order_ref.clone()),
            provider_payment_id: Some(self.provider_payment_id.clone()),
            split_part: false,
            refunded_amount: 0.0,
            created_at: ctx.now,
        };
        ctx.storage.put_payment(ctx.txn, &entry)?;

        Ok(order)
    }
}

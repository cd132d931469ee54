//! CancelOrder action - void an order before it is served
//!
//! Served orders cannot be cancelled (the refund flow handles those), and
//! a cancelled order stays cancelled; repeat attempts get the same
//! rejection. An optional refund can ride along with the cancellation,
//! but the business decision to void the order is independent of money
//! movement: a failing refund sub-step is logged and reported to the
//! caller as a warning, never rolled back into a failed cancel.

use shared::models::{Order, OrderStatus};
use tracing::warn;

use super::refund::apply_refund;
use super::{CommandContext, CommandHandler, OrderError};

pub struct CancelOrderAction {
    pub order_id: String,
    pub reason: String,
    /// Refund to attempt alongside the cancellation, if any
    pub refund_amount: Option<f64>,
}

impl CommandHandler for CancelOrderAction {
    fn execute(&self, ctx: &mut CommandContext<'_>) -> Result<Order, OrderError> {
        if self.reason.trim().is_empty() {
            return Err(OrderError::InvalidOperation(
                "cancellation requires a reason".to_string(),
            ));
        }

        let mut order = ctx.load_order(&self.order_id)?;
        match order.order_status {
            OrderStatus::Served => {
                return Err(OrderError::InvalidTransition {
                    from: "served".to_string(),
                    to: "cancelled".to_string(),
                });
            }
            OrderStatus::Cancelled => return Err(OrderError::AlreadyCancelled),
            _ => {}
        }

        order.order_status = OrderStatus::Cancelled;
        order.cancelled_at = Some(ctx.now);
        order.cancellation_reason = Some(self.reason.clone());

        if let Some(amount) = self.refund_amount {
            if let Err(err) = apply_refund(ctx, &mut order, amount, &self.reason) {
                warn!(
                    order_id = %order.id,
                    amount,
                    error = %err,
                    "refund sub-step failed; order stays cancelled"
                );
                ctx.warning = Some(format!("refund of {} failed: {}", amount, err));
            }
        }

        Ok(order)
    }
}

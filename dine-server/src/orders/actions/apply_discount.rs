//! ApplyDiscount action - staff discount before settlement
//!
//! Only one discount may be active: re-applying replaces the prior
//! record rather than stacking. The caller sends its computed amount and
//! the total it expects; the server recomputes the pre-discount total
//! and rejects anything that would drive the total negative or exceed it.

use shared::models::{DiscountKind, DiscountRecord, Order, OrderStatus, PaymentStatus};

use super::{CommandContext, CommandHandler, OrderError};
use crate::orders::money::{self, to_decimal, to_f64};

pub struct ApplyDiscountAction {
    pub order_id: String,
    pub kind: DiscountKind,
    /// Percentage (0..=100) or fixed currency value, per `kind`
    pub value: f64,
    /// Client-computed discount amount
    pub amount: f64,
    /// Client-computed resulting total, cross-checked server-side
    pub new_total: f64,
    pub reason: String,
}

impl CommandHandler for ApplyDiscountAction {
    fn execute(&self, ctx: &mut CommandContext<'_>) -> Result<Order, OrderError> {
        money::validate_amount(self.amount, "discount amount")?;
        if self.reason.trim().is_empty() {
            return Err(OrderError::InvalidOperation(
                "discount requires a reason".to_string(),
            ));
        }
        if let DiscountKind::Percentage = self.kind {
            if !(0.0..=100.0).contains(&self.value) {
                return Err(OrderError::InvalidOperation(format!(
                    "percentage must be between 0 and 100, got {}",
                    self.value
                )));
            }
        }

        let mut order = ctx.load_order(&self.order_id)?;
        if order.order_status == OrderStatus::Cancelled {
            return Err(OrderError::AlreadyCancelled);
        }
        if order.payment_status != PaymentStatus::Pending {
            return Err(OrderError::InvalidOperation(
                "totals are frozen once the order is paid".to_string(),
            ));
        }

        // Undo any existing discount to get the pre-discount total
        let original_total = to_f64(to_decimal(order.total) + to_decimal(order.discount_amount));
        if self.new_total < 0.0 {
            return Err(OrderError::InvalidOperation(format!(
                "discounted total must be non-negative, got {}",
                self.new_total
            )));
        }
        if money::exceeds(self.amount, original_total) {
            return Err(OrderError::DiscountExceedsTotal {
                amount: self.amount,
                original_total,
            });
        }
        let expected_total = to_f64(to_decimal(original_total) - to_decimal(self.amount));
        if !money::money_eq(self.new_total, expected_total) {
            return Err(OrderError::InvalidOperation(format!(
                "client total {} does not match recomputed total {}",
                self.new_total, expected_total
            )));
        }

        order.discount = Some(DiscountRecord {
            kind: self.kind,
            value: self.value,
            amount: self.amount,
            reason: self.reason.clone(),
            applied_at: ctx.now,
        });
        order.discount_amount = self.amount;
        order.total = expected_total;

        Ok(order)
    }
}

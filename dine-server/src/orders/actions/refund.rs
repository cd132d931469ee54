//! Refund action - return money against a settled order
//!
//! Refunds are capped by both the order total and the sum of recorded
//! ledger payments. A paid order with no ledger rows is an auditing gap
//! and fails with `PartialReconciliation` rather than refunding blind.
//! The refund is allocated greedily across ledger entries, and the order
//! and ledger rows update in the same transaction.

use shared::models::{Order, PaymentStatus};

use super::{CommandContext, CommandHandler, OrderError};
use crate::orders::money::{self, to_decimal, to_f64};

pub struct RefundAction {
    pub order_id: String,
    pub amount: f64,
    pub reason: String,
}

impl CommandHandler for RefundAction {
    fn execute(&self, ctx: &mut CommandContext<'_>) -> Result<Order, OrderError> {
        let mut order = ctx.load_order(&self.order_id)?;
        apply_refund(ctx, &mut order, self.amount, &self.reason)?;
        Ok(order)
    }
}

/// Apply a refund to a loaded order, updating the ledger in place
///
/// Shared with the cancel flow, which runs a refund as an optional
/// sub-step after voiding the order.
pub(crate) fn apply_refund(
    ctx: &CommandContext<'_>,
    order: &mut Order,
    amount: f64,
    reason: &str,
) -> Result<(), OrderError> {
    money::validate_amount(amount, "refund amount")?;
    if reason.trim().is_empty() {
        return Err(OrderError::InvalidOperation(
            "refund requires a reason".to_string(),
        ));
    }

    match order.payment_status {
        PaymentStatus::Paid | PaymentStatus::PartiallyRefunded => {}
        other => {
            return Err(OrderError::InvalidTransition {
                from: format!("{:?}", other).to_lowercase(),
                to: "refunded".to_string(),
            });
        }
    }

    let mut entries = ctx.storage.get_payments_for_order_txn(ctx.txn, &order.id)?;
    if entries.is_empty() {
        return Err(OrderError::PartialReconciliation(format!(
            "order {} is marked paid but has no payment records",
            order.id
        )));
    }

    // Refundable = min(total, recorded payments) minus what already went back
    let recorded = money::sum_paid(&entries);
    let already = to_decimal(order.refund_amount);
    let cap = to_decimal(order.total).min(to_decimal(recorded) + already);
    let refundable = to_f64(cap - already);
    if money::exceeds(amount, refundable) {
        return Err(OrderError::RefundExceedsPaid {
            requested: amount,
            refundable,
        });
    }

    // Allocate across ledger entries, largest remaining first
    entries.sort_by(|a, b| {
        let ra = to_decimal(a.amount) - to_decimal(a.refunded_amount);
        let rb = to_decimal(b.amount) - to_decimal(b.refunded_amount);
        rb.cmp(&ra)
    });
    let mut remaining = to_decimal(amount);
    for entry in entries.iter_mut() {
        if remaining.is_zero() {
            break;
        }
        let available = to_decimal(entry.amount) - to_decimal(entry.refunded_amount);
        if available <= rust_decimal::Decimal::ZERO {
            continue;
        }
        let take = remaining.min(available);
        entry.refunded_amount = to_f64(to_decimal(entry.refunded_amount) + take);
        remaining -= take;
        ctx.storage.put_payment(ctx.txn, entry)?;
    }

    order.refund_amount = to_f64(already + to_decimal(amount));
    order.refund_reason = Some(reason.to_string());
    order.refunded_at = Some(ctx.now);
    order.payment_status = if !money::exceeds(order.total, order.refund_amount) {
        PaymentStatus::Refunded
    } else {
        PaymentStatus::PartiallyRefunded
    };

    Ok(())
}

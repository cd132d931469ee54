//! SettleSplit action - settle an order with a cash leg and an online leg
//!
//! The two sub-amounts must reconcile with the order total within 0.01
//! (rounding tolerance); any larger discrepancy is rejected before
//! anything is written. Both legs land in the payment ledger tagged as
//! split parts, in the same transaction as the order update.

use shared::models::{
    ItemStatus, Order, OrderStatus, PaymentEntry, PaymentMethod, PaymentStatus, SplitBreakdown,
};
use uuid::Uuid;

use super::{CommandContext, CommandHandler, OrderError};
use crate::orders::money::{self, to_decimal, MONEY_TOLERANCE};

pub struct SettleSplitAction {
    pub order_id: String,
    pub cash_amount: f64,
    pub online_amount: f64,
    /// Gateway provider for the online leg, if any
    pub provider: Option<String>,
    pub provider_order_ref: Option<String>,
    pub provider_payment_id: Option<String>,
}

impl CommandHandler for SettleSplitAction {
    fn execute(&self, ctx: &mut CommandContext<'_>) -> Result<Order, OrderError> {
        money::validate_amount(self.cash_amount + self.online_amount, "split total")?;
        let mut order = ctx.load_order(&self.order_id)?;

        if order.order_status == OrderStatus::Cancelled {
            return Err(OrderError::AlreadyCancelled);
        }
        if order.payment_status != PaymentStatus::Pending {
            return Err(OrderError::InvalidTransition {
                from: format!("{:?}", order.payment_status).to_lowercase(),
                to: "paid".to_string(),
            });
        }

        let diff = (to_decimal(self.cash_amount) + to_decimal(self.online_amount)
            - to_decimal(order.total))
        .abs();
        if diff > MONEY_TOLERANCE {
            return Err(OrderError::SplitMismatch {
                cash: self.cash_amount,
                online: self.online_amount,
                total: order.total,
            });
        }
        if self.online_amount > 0.0 && self.provider.is_none() {
            return Err(OrderError::InvalidOperation(
                "online leg requires a gateway provider".to_string(),
            ));
        }

        order.payment_status = PaymentStatus::Paid;
        order.payment_method = PaymentMethod::Split;
        order.split = Some(SplitBreakdown {
            cash_amount: self.cash_amount,
            online_amount: self.online_amount,
            provider: self.provider.clone(),
            provider_payment_id: self.provider_payment_id.clone(),
        });
        if order.order_status == OrderStatus::PendingPayment {
            order.order_status = OrderStatus::Received;
            for item in &mut order.items {
                if item.item_status == ItemStatus::Queued {
                    item.item_status = ItemStatus::Received;
                }
            }
        }

        if self.cash_amount > 0.0 {
            ctx.storage.put_payment(
                ctx.txn,
                &PaymentEntry {
                    payment_id: Uuid::new_v4().to_string(),
                    order_id: order.id.clone(),
                    restaurant_id: order.restaurant_id.clone(),
                    method: "cash".to_string(),
                    amount: self.cash_amount,
                    provider_order_ref: None,
                    provider_payment_id: None,
                    split_part: true,
                    refunded_amount: 0.0,
                    created_at: ctx.now,
                },
            )?;
        }
        if self.online_amount > 0.0 {
            let provider = self.provider.clone().unwrap_or_default();
            ctx.storage.put_payment(
                ctx.txn,
                &PaymentEntry {
                    payment_id: Uuid::new_v4().to_string(),
                    order_id: order.id.clone(),
                    restaurant_id: order.restaurant_id.clone(),
                    method: provider,
                    amount: self.online_amount,
                    provider_order_ref: self.provider_order_ref.clone(),
                    provider_payment_id: self.provider_payment_id.clone(),
                    split_part: true,
                    refunded_amount: 0.0,
                    created_at: ctx.now,
                },
            )?;
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::{CreateOrderAction, OrderItemInput};
    use crate::orders::storage::OrderStorage;
    use shared::models::{CustomerInfo, OrderType};

    fn create_order(storage: &OrderStorage, price: f64) -> Order {
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, storage, 1);
        let order = CreateOrderAction {
            restaurant_id: "rest-1".to_string(),
            order_type: OrderType::DineIn,
            table_id: Some("table-1".to_string()),
            table_number: Some("4".to_string()),
            session_id: None,
            customer: CustomerInfo::default(),
            special_instructions: None,
            items: vec![OrderItemInput {
                menu_item_id: "menu-1".to_string(),
                name: "Thali".to_string(),
                price,
                quantity: 1,
                is_veg: true,
            }],
            payment_method: PaymentMethod::Online("razorpay".to_string()),
            tax_rate_percent: 0.0,
        }
        .execute(&mut ctx)
        .unwrap();
        storage.put_order(&txn, &order).unwrap();
        txn.commit().unwrap();
        order
    }

    fn split(order: &Order, cash: f64, online: f64) -> SettleSplitAction {
        SettleSplitAction {
            order_id: order.id.clone(),
            cash_amount: cash,
            online_amount: online,
            provider: (online > 0.0).then(|| "razorpay".to_string()),
            provider_order_ref: (online > 0.0).then(|| "order_S1".to_string()),
            provider_payment_id: (online > 0.0).then(|| "pay_S1".to_string()),
        }
    }

    #[test]
    fn test_split_records_both_legs() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let order = create_order(&storage, 500.0);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 5);
        let updated = split(&order, 200.0, 300.0).execute(&mut ctx).unwrap();
        storage.put_order(&txn, &updated).unwrap();
        txn.commit().unwrap();

        assert_eq!(updated.payment_status, PaymentStatus::Paid);
        assert_eq!(updated.payment_method, PaymentMethod::Split);
        let breakdown = updated.split.unwrap();
        assert_eq!(breakdown.cash_amount, 200.0);
        assert_eq!(breakdown.online_amount, 300.0);

        let entries = storage.get_payments_for_order(&order.id).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.split_part));
        assert!(entries.iter().any(|e| e.method == "cash"));
        assert!(entries.iter().any(|e| e.method == "razorpay"));
    }

    #[test]
    fn test_split_mismatch_rejected_beyond_epsilon() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let order = create_order(&storage, 500.0);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 5);
        assert!(matches!(
            split(&order, 200.0, 299.0).execute(&mut ctx),
            Err(OrderError::SplitMismatch { .. })
        ));
        // Nothing written on rejection
        drop(ctx);
        txn.abort().unwrap();
        assert!(storage.get_payments_for_order(&order.id).unwrap().is_empty());
    }

    #[test]
    fn test_split_within_epsilon_accepted() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let order = create_order(&storage, 500.0);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 5);
        // 200.00 + 300.01 vs 500.00: off by exactly the tolerance
        let updated = split(&order, 200.0, 300.01).execute(&mut ctx).unwrap();
        assert_eq!(updated.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_online_leg_requires_provider() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let order = create_order(&storage, 500.0);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 5);
        let mut action = split(&order, 200.0, 300.0);
        action.provider = None;
        assert!(action.execute(&mut ctx).is_err());
    }
}

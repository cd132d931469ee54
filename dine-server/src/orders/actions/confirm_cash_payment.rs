//! ConfirmCashPayment action - staff confirms a cash settlement
//!
//! Cash orders are already in the kitchen when this runs; it only settles
//! the money side and writes the ledger row.

use shared::models::{Order, OrderStatus, PaymentEntry, PaymentMethod, PaymentStatus};
use uuid::Uuid;

use super::{CommandContext, CommandHandler, OrderError};

pub struct ConfirmCashPaymentAction {
    pub order_id: String,
}

impl CommandHandler for ConfirmCashPaymentAction {
    fn execute(&self, ctx: &mut CommandContext<'_>) -> Result<Order, OrderError> {
        let mut order = ctx.load_order(&self.order_id)?;

        if order.payment_method != PaymentMethod::Cash {
            return Err(OrderError::InvalidOperation(
                "order is not a cash order".to_string(),
            ));
        }
        if order.order_status == OrderStatus::Cancelled {
            return Err(OrderError::AlreadyCancelled);
        }
        if order.payment_status != PaymentStatus::Pending {
            return Err(OrderError::InvalidTransition {
                from: format!("{:?}", order.payment_status).to_lowercase(),
                to: "paid".to_string(),
            });
        }

        order.payment_status = PaymentStatus::Paid;

        let entry = PaymentEntry {
            payment_id: Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            restaurant_id: order.restaurant_id.clone(),
            method: "cash".to_string(),
            amount: order.total,
            provider_order_ref: None,
            provider_payment_id: None,
            split_part: false,
            refunded_amount: 0.0,
            created_at: ctx.now,
        };
        ctx.storage.put_payment(ctx.txn, &entry)?;

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::{CreateOrderAction, OrderItemInput};
    use crate::orders::storage::OrderStorage;
    use shared::models::{CustomerInfo, OrderType};

    fn create_cash_order(storage: &OrderStorage) -> Order {
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
                name: "Masala Dosa".to_string(),
                price: 150.0,
                quantity: 2,
                is_veg: true,
            }],
            payment_method: PaymentMethod::Cash,
            tax_rate_percent: 5.0,
        }
        .execute(&mut ctx)
        .unwrap();
        storage.put_order(&txn, &order).unwrap();
        txn.commit().unwrap();
        order
    }

    #[test]
    fn test_cash_confirmation_settles_and_records_ledger() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let order = create_cash_order(&storage);
        assert_eq!(order.order_status, OrderStatus::Received);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 9);
        let updated = ConfirmCashPaymentAction {
            order_id: order.id.clone(),
        }
        .execute(&mut ctx)
        .unwrap();
        storage.put_order(&txn, &updated).unwrap();
        txn.commit().unwrap();

        assert_eq!(updated.payment_status, PaymentStatus::Paid);
        // Kitchen progress is untouched by settlement
        assert_eq!(updated.order_status, OrderStatus::Received);

        let entries = storage.get_payments_for_order(&order.id).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].method, "cash");
        assert_eq!(entries[0].amount, updated.total);
    }

    #[test]
    fn test_double_confirmation_rejected() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let order = create_cash_order(&storage);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 9);
        let updated = ConfirmCashPaymentAction {
            order_id: order.id.clone(),
        }
        .execute(&mut ctx)
        .unwrap();
        storage.put_order(&txn, &updated).unwrap();
        txn.commit().unwrap();

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 10);
        assert!(matches!(
            ConfirmCashPaymentAction {
                order_id: order.id.clone(),
            }
            .execute(&mut ctx),
            Err(OrderError::InvalidTransition { .. })
        ));
    }
}

//! UpdateItemStatus action - kitchen/waiter progress on one line item
//!
//! Stamps the matching lifecycle timestamp on first entry into a stage,
//! then re-runs the order-status derivation. The updated items array and
//! any resulting order-status change persist as one unit.

use shared::models::{ItemStatus, Order};

use super::{CommandContext, CommandHandler, OrderError};
use crate::orders::reducer;

pub struct UpdateItemStatusAction {
    pub order_id: String,
    pub menu_item_id: String,
    pub target: ItemStatus,
}

impl CommandHandler for UpdateItemStatusAction {
    fn execute(&self, ctx: &mut CommandContext<'_>) -> Result<Order, OrderError> {
        let mut order = ctx.load_order(&self.order_id)?;
        reducer::apply_item_status(&mut order, &self.menu_item_id, self.target, ctx.now)?;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::{CreateOrderAction, OrderItemInput};
    use crate::orders::storage::OrderStorage;
    use shared::models::{CustomerInfo, OrderStatus, OrderType, PaymentMethod};

    fn create_order(storage: &OrderStorage) -> Order {
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
            items: vec![
                OrderItemInput {
                    menu_item_id: "menu-1".to_string(),
                    name: "Idli".to_string(),
                    price: 80.0,
                    quantity: 2,
                    is_veg: true,
                },
                OrderItemInput {
                    menu_item_id: "menu-2".to_string(),
                    name: "Vada".to_string(),
                    price: 60.0,
                    quantity: 1,
                    is_veg: true,
                },
            ],
            payment_method: PaymentMethod::Cash,
            tax_rate_percent: 0.0,
        }
        .execute(&mut ctx)
        .unwrap();
        storage.put_order(&txn, &order).unwrap();
        txn.commit().unwrap();
        order
    }

    fn advance(storage: &OrderStorage, order_id: &str, item: &str, target: ItemStatus) -> Order {
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, storage, 7);
        let updated = UpdateItemStatusAction {
            order_id: order_id.to_string(),
            menu_item_id: item.to_string(),
            target,
        }
        .execute(&mut ctx)
        .unwrap();
        storage.put_order(&txn, &updated).unwrap();
        txn.commit().unwrap();
        updated
    }

    #[test]
    fn test_item_progress_cascades_to_order() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let order = create_order(&storage);

        let updated = advance(&storage, &order.id, "menu-1", ItemStatus::Ready);
        // Other item still queued: order stays preparing
        assert_eq!(updated.order_status, OrderStatus::Preparing);

        let updated = advance(&storage, &order.id, "menu-2", ItemStatus::Ready);
        assert_eq!(updated.order_status, OrderStatus::Ready);
        assert_eq!(updated.item("menu-2").unwrap().ready_at, Some(7));

        let updated = advance(&storage, &order.id, "menu-1", ItemStatus::Served);
        // One served, one ready: still ready overall
        assert_eq!(updated.order_status, OrderStatus::Ready);
        let updated = advance(&storage, &order.id, "menu-2", ItemStatus::Served);
        assert_eq!(updated.order_status, OrderStatus::Served);
    }

    #[test]
    fn test_missing_item_rejected() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let order = create_order(&storage);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 7);
        let err = UpdateItemStatusAction {
            order_id: order.id.clone(),
            menu_item_id: "menu-9".to_string(),
            target: ItemStatus::Ready,
        }
        .execute(&mut ctx)
        .unwrap_err();
        assert!(matches!(err, OrderError::ItemNotFound(_)));
    }
}

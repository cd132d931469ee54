//! CreateOrder action - create a new order from checkout submission
//!
//! Cash orders skip the payment-gateway leg: they enter the kitchen
//! immediately (`received`, payment pending) and are settled later by
//! ConfirmCashPayment. Online orders start in `pending_payment` and only
//! MarkPaid (driven by gateway verification) moves them forward.

use shared::models::{
    CustomerInfo, Order, OrderItem, OrderStatus, OrderType, PaymentMethod, PaymentStatus,
};
use shared::util::{now_millis, order_token};
use uuid::Uuid;

use super::{CommandContext, CommandHandler, OrderError};
use crate::orders::money;

/// Caller-supplied line item
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OrderItemInput {
    pub menu_item_id: String,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
    #[serde(default)]
    pub is_veg: bool,
}

pub struct CreateOrderAction {
    pub restaurant_id: String,
    pub order_type: OrderType,
    pub table_id: Option<String>,
    pub table_number: Option<String>,
    pub session_id: Option<String>,
    pub customer: CustomerInfo,
    pub special_instructions: Option<String>,
    pub items: Vec<OrderItemInput>,
    pub payment_method: PaymentMethod,
    /// Tax rate in percent, applied to the discounted subtotal
    pub tax_rate_percent: f64,
}

impl CommandHandler for CreateOrderAction {
    fn execute(&self, ctx: &mut CommandContext<'_>) -> Result<Order, OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::InvalidOperation(
                "order must contain at least one item".to_string(),
            ));
        }
        if matches!(self.order_type, OrderType::DineIn) && self.table_id.is_none() {
            return Err(OrderError::InvalidOperation(
                "dine-in order requires a table".to_string(),
            ));
        }

        let items: Vec<OrderItem> = self
            .items
            .iter()
            .map(|input| OrderItem {
                menu_item_id: input.menu_item_id.clone(),
                name: input.name.clone(),
                price: input.price,
                quantity: input.quantity,
                is_veg: input.is_veg,
                item_status: Default::default(),
                started_at: None,
                ready_at: None,
                served_at: None,
            })
            .collect();
        for item in &items {
            money::validate_item(item)?;
        }

        // Cash settles later; online waits for gateway verification
        let order_status = match self.payment_method {
            PaymentMethod::Cash => OrderStatus::Received,
            _ => OrderStatus::PendingPayment,
        };

        let order_number = ctx.storage.next_order_number(ctx.txn, &self.restaurant_id)?;
        let now = now_millis();

        let mut order = Order {
            id: Uuid::new_v4().to_string(),
            restaurant_id: self.restaurant_id.clone(),
            order_number,
            order_token: order_token(),
            order_type: self.order_type,
            table_id: self.table_id.clone(),
            table_number: self.table_number.clone(),
            session_id: self.session_id.clone(),
            customer: self.customer.clone(),
            special_instructions: self.special_instructions.clone(),
            items,
            subtotal: 0.0,
            discount_amount: 0.0,
            discount: None,
            tax: 0.0,
            total: 0.0,
            payment_status: PaymentStatus::Pending,
            payment_method: self.payment_method.clone(),
            split: None,
            refund_amount: 0.0,
            refund_reason: None,
            refunded_at: None,
            order_status,
            cancelled_at: None,
            cancellation_reason: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        money::recalculate_totals(&mut order, self.tax_rate_percent);

        ctx.storage.put_order_token(ctx.txn, &order)?;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::storage::OrderStorage;

    fn inputs() -> Vec<OrderItemInput> {
        vec![
            OrderItemInput {
                menu_item_id: "menu-1".to_string(),
                name: "Paneer Tikka".to_string(),
                price: 250.0,
                quantity: 2,
                is_veg: true,
            },
            OrderItemInput {
                menu_item_id: "menu-2".to_string(),
                name: "Butter Naan".to_string(),
                price: 60.0,
                quantity: 3,
                is_veg: true,
            },
        ]
    }

    fn action(payment_method: PaymentMethod) -> CreateOrderAction {
        CreateOrderAction {
            restaurant_id: "rest-1".to_string(),
            order_type: OrderType::DineIn,
            table_id: Some("table-1".to_string()),
            table_number: Some("4".to_string()),
            session_id: None,
            customer: CustomerInfo::default(),
            special_instructions: None,
            items: inputs(),
            payment_method,
            tax_rate_percent: 5.0,
        }
    }

    #[test]
    fn test_online_order_starts_pending_payment() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 1);

        let order = action(PaymentMethod::Online("razorpay".to_string()))
            .execute(&mut ctx)
            .unwrap();

        assert_eq!(order.order_status, OrderStatus::PendingPayment);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.subtotal, 680.0);
        assert_eq!(order.tax, 34.0);
        assert_eq!(order.total, 714.0);
        assert!(order.totals_consistent());
        assert_eq!(order.order_number, 101);
    }

    #[test]
    fn test_cash_order_enters_kitchen_immediately() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 1);

        let order = action(PaymentMethod::Cash).execute(&mut ctx).unwrap();
        assert_eq!(order.order_status, OrderStatus::Received);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn test_empty_items_rejected() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 1);

        let mut a = action(PaymentMethod::Cash);
        a.items.clear();
        assert!(matches!(
            a.execute(&mut ctx),
            Err(OrderError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_dine_in_requires_table() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 1);

        let mut a = action(PaymentMethod::Cash);
        a.table_id = None;
        assert!(a.execute(&mut ctx).is_err());

        // Takeaway without a table is fine
        let mut a = action(PaymentMethod::Cash);
        a.order_type = OrderType::Takeaway;
        a.table_id = None;
        a.table_number = None;
        assert!(a.execute(&mut ctx).is_ok());
    }

    #[test]
    fn test_invalid_item_rejected() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 1);

        let mut a = action(PaymentMethod::Cash);
        a.items[0].quantity = 0;
        assert!(a.execute(&mut ctx).is_err());
    }
}

use super::*;
use crate::message::MessageBus;
use crate::orders::actions::{
    ApplyDiscountAction, CancelOrderAction, CommandAction, ConfirmCashPaymentAction,
    CreateOrderAction, MarkPaidAction, OrderItemInput, RefundAction, SettleSplitAction,
    UpdateItemStatusAction,
};
use shared::models::{
    CustomerInfo, DiscountKind, ItemStatus, OrderType, PaymentMethod,
};

mod test_boundary;
mod test_flows;

fn create_test_manager() -> OrdersManager {
    OrdersManager::new_in_memory(MessageBus::new(), 0.0).unwrap()
}

fn item(id: &str, price: f64, quantity: i32) -> OrderItemInput {
    OrderItemInput {
        menu_item_id: id.to_string(),
        name: id.to_string(),
        price,
        quantity,
        is_veg: true,
    }
}

fn create_order_action(payment_method: PaymentMethod, items: Vec<OrderItemInput>) -> CommandAction {
    CommandAction::CreateOrder(CreateOrderAction {
        restaurant_id: "rest-1".to_string(),
        order_type: OrderType::DineIn,
        table_id: Some("table-1".to_string()),
        table_number: Some("4".to_string()),
        session_id: None,
        customer: CustomerInfo::default(),
        special_instructions: None,
        items,
        payment_method,
        tax_rate_percent: 0.0,
    })
}

fn create_cash_order(manager: &OrdersManager, items: Vec<OrderItemInput>) -> Order {
    manager
        .execute(
            create_order_action(PaymentMethod::Cash, items),
            CommandMetadata::default(),
        )
        .unwrap()
}

fn create_online_order(manager: &OrdersManager, items: Vec<OrderItemInput>) -> Order {
    manager
        .execute(
            create_order_action(PaymentMethod::Online("razorpay".to_string()), items),
            CommandMetadata::default(),
        )
        .unwrap()
}

fn mark_paid(manager: &OrdersManager, order: &Order) -> Order {
    manager
        .execute(
            CommandAction::MarkPaid(MarkPaidAction {
                order_id: order.id.clone(),
                provider: "razorpay".to_string(),
                amount: order.total,
                provider_order_ref: format!("order_{}", order.order_number),
                provider_payment_id: format!("pay_{}", order.order_number),
            }),
            CommandMetadata::default(),
        )
        .unwrap()
}

fn set_item_status(manager: &OrdersManager, order_id: &str, item_id: &str, target: ItemStatus) -> Order {
    manager
        .execute(
            CommandAction::UpdateItemStatus(UpdateItemStatusAction {
                order_id: order_id.to_string(),
                menu_item_id: item_id.to_string(),
                target,
            }),
            CommandMetadata::default(),
        )
        .unwrap()
}

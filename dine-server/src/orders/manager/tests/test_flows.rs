//! End-to-end command flows through the manager

use super::*;
use shared::message::{ChangeKind, ChangedEntity};
use shared::models::{OrderStatus, PaymentStatus};

#[test]
fn test_online_order_lifecycle() {
    let manager = create_test_manager();
    let order = create_online_order(&manager, vec![item("menu-1", 250.0, 2), item("menu-2", 25.0, 1)]);

    assert_eq!(order.order_status, OrderStatus::PendingPayment);
    assert_eq!(order.total, 525.0);
    assert_eq!(order.version, 1);

    let paid = mark_paid(&manager, &order);
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(paid.order_status, OrderStatus::Received);
    assert_eq!(paid.version, 2);

    for id in ["menu-1", "menu-2"] {
        set_item_status(&manager, &order.id, id, ItemStatus::Preparing);
    }
    assert_eq!(
        manager.get_order(&order.id).unwrap().order_status,
        OrderStatus::Preparing
    );

    for id in ["menu-1", "menu-2"] {
        set_item_status(&manager, &order.id, id, ItemStatus::Ready);
    }
    assert_eq!(
        manager.get_order(&order.id).unwrap().order_status,
        OrderStatus::Ready
    );

    for id in ["menu-1", "menu-2"] {
        set_item_status(&manager, &order.id, id, ItemStatus::Served);
    }
    let final_order = manager.get_order(&order.id).unwrap();
    assert_eq!(final_order.order_status, OrderStatus::Served);

    // Served and settled: off the active dashboard
    assert!(manager.list_active_orders("rest-1").unwrap().is_empty());
}

#[test]
fn test_three_item_cascade_scenario() {
    let manager = create_test_manager();
    let order = create_cash_order(
        &manager,
        vec![item("a", 100.0, 1), item("b", 100.0, 1), item("c", 100.0, 1)],
    );

    set_item_status(&manager, &order.id, "a", ItemStatus::Ready);
    set_item_status(&manager, &order.id, "b", ItemStatus::Ready);
    let updated = set_item_status(&manager, &order.id, "c", ItemStatus::Preparing);
    assert_eq!(updated.order_status, OrderStatus::Preparing);

    let updated = set_item_status(&manager, &order.id, "c", ItemStatus::Ready);
    assert_eq!(updated.order_status, OrderStatus::Ready);

    for id in ["a", "b", "c"] {
        set_item_status(&manager, &order.id, id, ItemStatus::Served);
    }
    assert_eq!(
        manager.get_order(&order.id).unwrap().order_status,
        OrderStatus::Served
    );
}

#[test]
fn test_refund_sequence_on_525_order() {
    let manager = create_test_manager();
    let order = create_cash_order(&manager, vec![item("menu-1", 525.0, 1)]);
    manager
        .execute(
            CommandAction::ConfirmCashPayment(ConfirmCashPaymentAction {
                order_id: order.id.clone(),
            }),
            CommandMetadata::default(),
        )
        .unwrap();

    let refund = |amount: f64| {
        manager.execute(
            CommandAction::Refund(RefundAction {
                order_id: order.id.clone(),
                amount,
                reason: "cold food".to_string(),
            }),
            CommandMetadata::default(),
        )
    };

    let after_first = refund(200.0).unwrap();
    assert_eq!(after_first.payment_status, PaymentStatus::PartiallyRefunded);
    assert_eq!(after_first.refund_amount, 200.0);

    let after_second = refund(325.0).unwrap();
    assert_eq!(after_second.payment_status, PaymentStatus::Refunded);
    assert_eq!(after_second.refund_amount, 525.0);

    // Fully refunded: any further amount is rejected
    assert!(refund(0.01).is_err());
}

#[test]
fn test_split_settlement_flow() {
    let manager = create_test_manager();
    let order = create_online_order(&manager, vec![item("menu-1", 500.0, 1)]);

    let settled = manager
        .execute(
            CommandAction::SettleSplit(SettleSplitAction {
                order_id: order.id.clone(),
                cash_amount: 200.0,
                online_amount: 300.0,
                provider: Some("razorpay".to_string()),
                provider_order_ref: Some("order_S".to_string()),
                provider_payment_id: Some("pay_S".to_string()),
            }),
            CommandMetadata::default(),
        )
        .unwrap();

    assert_eq!(settled.payment_status, PaymentStatus::Paid);
    assert_eq!(settled.payment_method, PaymentMethod::Split);
    let entries = manager.payments_for_order(&order.id).unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.split_part));
}

#[test]
fn test_discount_then_pay_flow() {
    let manager = create_test_manager();
    let order = create_online_order(&manager, vec![item("menu-1", 400.0, 1)]);

    let discounted = manager
        .execute(
            CommandAction::ApplyDiscount(ApplyDiscountAction {
                order_id: order.id.clone(),
                kind: DiscountKind::Percentage,
                value: 10.0,
                amount: 40.0,
                new_total: 360.0,
                reason: "loyalty".to_string(),
            }),
            CommandMetadata::default(),
        )
        .unwrap();
    assert_eq!(discounted.total, 360.0);

    let paid = mark_paid(&manager, &discounted);
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(manager.payments_for_order(&order.id).unwrap()[0].amount, 360.0);
}

#[test]
fn test_change_events_published_after_commit() {
    let bus = MessageBus::new();
    let mut rx = bus.subscribe_changes();
    let manager = OrdersManager::new_in_memory(bus, 0.0).unwrap();

    let order = create_cash_order(&manager, vec![item("menu-1", 100.0, 1)]);

    let ev = rx.try_recv().unwrap();
    assert_eq!(ev.entity, ChangedEntity::Order);
    assert_eq!(ev.change, ChangeKind::Created);
    assert_eq!(ev.id, order.id);
    // The payload is a pointer, not a snapshot: re-fetch sees the row
    assert!(manager.get_order(&ev.id).is_ok());

    set_item_status(&manager, &order.id, "menu-1", ItemStatus::Ready);
    let ev = rx.try_recv().unwrap();
    assert_eq!(ev.change, ChangeKind::Updated);
}

#[test]
fn test_complaint_lifecycle_is_independent() {
    let manager = create_test_manager();
    let order = create_cash_order(&manager, vec![item("menu-1", 100.0, 1)]);
    let before = manager.get_order(&order.id).unwrap();

    let complaint = manager.file_complaint(&order.id, "food was cold").unwrap();
    assert_eq!(complaint.order_id, order.id);

    let resolved = manager.resolve_complaint(&complaint.id).unwrap();
    assert!(resolved.resolved_at.is_some());

    // Resolving never touches the order
    let after = manager.get_order(&order.id).unwrap();
    assert_eq!(after, before);

    assert!(manager.resolve_complaint("missing").is_err());
    assert!(manager.file_complaint(&order.id, "  ").is_err());
}

#[test]
fn test_customer_token_lookup() {
    let manager = create_test_manager();
    let order = create_cash_order(&manager, vec![item("menu-1", 100.0, 1)]);

    let found = manager.get_order_by_token(&order.order_token).unwrap();
    assert_eq!(found.id, order.id);
    assert!(manager.get_order_by_token("bogus").is_err());
}

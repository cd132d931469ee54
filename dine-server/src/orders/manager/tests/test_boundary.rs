//! Boundary and failure-path tests

use super::*;
use shared::models::{OrderStatus, PaymentStatus};

#[test]
fn test_replayed_command_returns_stored_outcome() {
    let manager = create_test_manager();
    let metadata = CommandMetadata {
        command_id: Some("cmd-1".to_string()),
        expected_version: None,
    };

    let first = manager
        .execute(
            create_order_action(PaymentMethod::Cash, vec![item("menu-1", 100.0, 1)]),
            metadata.clone(),
        )
        .unwrap();

    // Replay does not create a second order
    let replayed = manager
        .execute(
            create_order_action(PaymentMethod::Cash, vec![item("menu-1", 100.0, 1)]),
            metadata,
        )
        .unwrap();
    assert_eq!(replayed.id, first.id);
    assert_eq!(replayed.order_number, first.order_number);
    assert_eq!(manager.list_active_orders("rest-1").unwrap().len(), 1);
}

#[test]
fn test_version_conflict_aborts_command() {
    let manager = create_test_manager();
    let order = create_cash_order(&manager, vec![item("menu-1", 100.0, 1)]);
    assert_eq!(order.version, 1);

    // Another writer moved the order forward
    set_item_status(&manager, &order.id, "menu-1", ItemStatus::Preparing);

    let err = manager
        .execute(
            CommandAction::UpdateItemStatus(UpdateItemStatusAction {
                order_id: order.id.clone(),
                menu_item_id: "menu-1".to_string(),
                target: ItemStatus::Ready,
            }),
            CommandMetadata {
                command_id: None,
                expected_version: Some(1),
            },
        )
        .unwrap_err();
    assert!(matches!(err, ManagerError::ConcurrencyConflict { .. }));

    // The store is untouched by the failed command
    let current = manager.get_order(&order.id).unwrap();
    assert_eq!(current.version, 2);
    assert_eq!(
        current.item("menu-1").unwrap().item_status,
        ItemStatus::Preparing
    );

    // Retry with the observed version succeeds
    let updated = manager
        .execute(
            CommandAction::UpdateItemStatus(UpdateItemStatusAction {
                order_id: order.id.clone(),
                menu_item_id: "menu-1".to_string(),
                target: ItemStatus::Ready,
            }),
            CommandMetadata {
                command_id: None,
                expected_version: Some(2),
            },
        )
        .unwrap();
    assert_eq!(updated.version, 3);
}

#[test]
fn test_failed_action_leaves_no_trace() {
    let manager = create_test_manager();
    let order = create_online_order(&manager, vec![item("menu-1", 500.0, 1)]);

    let err = manager
        .execute(
            CommandAction::SettleSplit(SettleSplitAction {
                order_id: order.id.clone(),
                cash_amount: 100.0,
                online_amount: 100.0,
                provider: Some("razorpay".to_string()),
                provider_order_ref: None,
                provider_payment_id: None,
            }),
            CommandMetadata::default(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Order(crate::orders::actions::OrderError::SplitMismatch { .. })
    ));

    // Neither the order nor the ledger changed
    let current = manager.get_order(&order.id).unwrap();
    assert_eq!(current.payment_status, PaymentStatus::Pending);
    assert_eq!(current.version, 1);
    assert!(manager.payments_for_order(&order.id).unwrap().is_empty());
}

#[test]
fn test_cancel_rejections_repeat_identically() {
    let manager = create_test_manager();
    let order = create_cash_order(&manager, vec![item("menu-1", 100.0, 1)]);
    set_item_status(&manager, &order.id, "menu-1", ItemStatus::Served);

    let cancel = || {
        manager.execute(
            CommandAction::CancelOrder(CancelOrderAction {
                order_id: order.id.clone(),
                reason: "too late".to_string(),
                refund_amount: None,
            }),
            CommandMetadata::default(),
        )
    };
    for _ in 0..3 {
        assert!(matches!(
            cancel().unwrap_err(),
            ManagerError::Order(crate::orders::actions::OrderError::InvalidTransition { .. })
        ));
    }
}

#[test]
fn test_served_order_cannot_regress_into_cancellable_state() {
    let manager = create_test_manager();
    let order = create_cash_order(&manager, vec![item("menu-1", 100.0, 1)]);
    set_item_status(&manager, &order.id, "menu-1", ItemStatus::Served);

    // Moving an item backward out of served is rejected
    let err = manager
        .execute(
            CommandAction::UpdateItemStatus(UpdateItemStatusAction {
                order_id: order.id.clone(),
                menu_item_id: "menu-1".to_string(),
                target: ItemStatus::Preparing,
            }),
            CommandMetadata::default(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Order(crate::orders::actions::OrderError::InvalidTransition { .. })
    ));
    assert_eq!(
        manager.get_order(&order.id).unwrap().order_status,
        OrderStatus::Served
    );

    // So the cancel guard still holds: served orders go through refund
    assert!(
        manager
            .execute(
                CommandAction::CancelOrder(CancelOrderAction {
                    order_id: order.id.clone(),
                    reason: "changed mind".to_string(),
                    refund_amount: None,
                }),
                CommandMetadata::default(),
            )
            .is_err()
    );
}

#[test]
fn test_served_but_unpaid_order_stays_active() {
    let manager = create_test_manager();
    let order = create_cash_order(&manager, vec![item("menu-1", 100.0, 1)]);
    set_item_status(&manager, &order.id, "menu-1", ItemStatus::Served);

    // Served but cash never confirmed: still on the dashboard
    let active = manager.list_active_orders("rest-1").unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].order_status, OrderStatus::Served);

    manager
        .execute(
            CommandAction::ConfirmCashPayment(ConfirmCashPaymentAction {
                order_id: order.id.clone(),
            }),
            CommandMetadata::default(),
        )
        .unwrap();
    assert!(manager.list_active_orders("rest-1").unwrap().is_empty());
}

#[test]
fn test_cancel_reports_failed_refund_leg() {
    let manager = create_test_manager();
    let order = create_cash_order(&manager, vec![item("menu-1", 100.0, 1)]);

    // Unpaid order: the refund leg cannot succeed, the cancel still does
    let (cancelled, refund_error) = manager
        .execute_with_outcome(
            CommandAction::CancelOrder(CancelOrderAction {
                order_id: order.id.clone(),
                reason: "kitchen out of stock".to_string(),
                refund_amount: Some(100.0),
            }),
            CommandMetadata::default(),
        )
        .unwrap();

    assert_eq!(cancelled.order_status, OrderStatus::Cancelled);
    assert_eq!(cancelled.payment_status, PaymentStatus::Pending);
    assert_eq!(cancelled.refund_amount, 0.0);
    assert!(refund_error.is_some());

    // A refund that goes through carries no warning
    let paid_order = create_cash_order(&manager, vec![item("menu-1", 100.0, 1)]);
    manager
        .execute(
            CommandAction::ConfirmCashPayment(ConfirmCashPaymentAction {
                order_id: paid_order.id.clone(),
            }),
            CommandMetadata::default(),
        )
        .unwrap();
    let (cancelled, refund_error) = manager
        .execute_with_outcome(
            CommandAction::CancelOrder(CancelOrderAction {
                order_id: paid_order.id.clone(),
                reason: "guest left".to_string(),
                refund_amount: Some(100.0),
            }),
            CommandMetadata::default(),
        )
        .unwrap();
    assert_eq!(cancelled.payment_status, PaymentStatus::Refunded);
    assert!(refund_error.is_none());
}

#[test]
fn test_cancelled_order_leaves_dashboard() {
    let manager = create_test_manager();
    let order = create_cash_order(&manager, vec![item("menu-1", 100.0, 1)]);
    assert_eq!(manager.list_active_orders("rest-1").unwrap().len(), 1);

    manager
        .execute(
            CommandAction::CancelOrder(CancelOrderAction {
                order_id: order.id.clone(),
                reason: "guest left".to_string(),
                refund_amount: None,
            }),
            CommandMetadata::default(),
        )
        .unwrap();
    assert!(manager.list_active_orders("rest-1").unwrap().is_empty());
}

#[test]
fn test_order_numbers_increase_per_restaurant() {
    let manager = create_test_manager();
    let first = create_cash_order(&manager, vec![item("menu-1", 100.0, 1)]);
    let second = create_cash_order(&manager, vec![item("menu-1", 100.0, 1)]);
    assert_eq!(second.order_number, first.order_number + 1);
}

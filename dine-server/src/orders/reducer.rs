//! Order status derivation from item statuses
//!
//! Pure logic, re-evaluated whenever any item's status changes. The
//! order-level status is never set independently of this rule except for
//! `pending_payment` and `cancelled`, which only the explicit payment and
//! cancel operations may produce.

use shared::models::{ItemStatus, Order, OrderStatus};

use crate::orders::actions::OrderError;

/// Derive the order-level status from the current item statuses
///
/// - `served` iff all items are served
/// - else `ready` iff all items are ready or served
/// - else `preparing` iff at least one item is queued, received, or preparing
/// - else `None`: leave the order status unchanged (empty item list)
pub fn derive_order_status(items: &[shared::models::OrderItem]) -> Option<OrderStatus> {
    if items.is_empty() {
        return None;
    }

    if items.iter().all(|i| i.item_status == ItemStatus::Served) {
        return Some(OrderStatus::Served);
    }

    if items
        .iter()
        .all(|i| matches!(i.item_status, ItemStatus::Ready | ItemStatus::Served))
    {
        return Some(OrderStatus::Ready);
    }

    if items.iter().any(|i| {
        matches!(
            i.item_status,
            ItemStatus::Queued | ItemStatus::Received | ItemStatus::Preparing
        )
    }) {
        return Some(OrderStatus::Preparing);
    }

    None
}

/// Apply a status change to one item and cascade it to the order status
///
/// Lifecycle timestamps (`started_at`/`ready_at`/`served_at`) are stamped
/// only on first entry into the corresponding stage, so replayed updates
/// do not move them. Item updates are rejected once the order is in a
/// terminal state (`served` is closed out by refund, `cancelled` is void)
/// and while payment is still pending; those statuses bypass the
/// derivation entirely.
pub fn apply_item_status(
    order: &mut Order,
    menu_item_id: &str,
    target: ItemStatus,
    now: i64,
) -> Result<(), OrderError> {
    if order.order_status.is_terminal() {
        return Err(OrderError::InvalidTransition {
            from: format!("{:?}", order.order_status).to_lowercase(),
            to: format!("{:?}", target).to_lowercase(),
        });
    }
    if order.order_status == OrderStatus::PendingPayment {
        return Err(OrderError::InvalidTransition {
            from: "pending_payment".to_string(),
            to: format!("{:?}", target).to_lowercase(),
        });
    }

    let item = order
        .item_mut(menu_item_id)
        .ok_or_else(|| OrderError::ItemNotFound(menu_item_id.to_string()))?;

    item.item_status = target;
    match target {
        ItemStatus::Preparing => {
            if item.started_at.is_none() {
                item.started_at = Some(now);
            }
        }
        ItemStatus::Ready => {
            if item.ready_at.is_none() {
                item.ready_at = Some(now);
            }
        }
        ItemStatus::Served => {
            if item.served_at.is_none() {
                item.served_at = Some(now);
            }
        }
        ItemStatus::Queued | ItemStatus::Received => {}
    }

    if let Some(status) = derive_order_status(&order.items) {
        order.order_status = status;
    }

    Ok(())
}

//! OrdersManager - command execution over the order store
//!
//! # Command Flow
//!
//! ```text
//! execute(action, metadata)
//!     ├─ 1. Idempotency check (command_id)
//!     ├─ 2. Begin write transaction
//!     ├─ 3. Create CommandContext and execute the action
//!     ├─ 4. Optimistic version check (expected_version)
//!     ├─ 5. Bump version, persist order + indexes
//!     ├─ 6. Mark command processed
//!     ├─ 7. Commit transaction
//!     └─ 8. Broadcast change event
//! ```
//!
//! Every multi-record mutation an action performs (order + ledger, order +
//! token) shares the transaction opened in step 2, so a crash between any
//! two steps leaves no half-written state. Broadcast happens strictly
//! after commit: subscribers re-fetching on a change event always see the
//! committed row.

mod error;
pub use error::*;

#[cfg(test)]
mod tests;

use shared::message::{ChangeKind, ChangedEntity, EphemeralKind};
use shared::models::{Complaint, ComplaintStatus, Order, OrderStatus, PaymentEntry, PaymentStatus};
use shared::util::now_millis;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

use super::actions::{CommandAction, CommandContext, CommandHandler, CommandMetadata};
use super::storage::OrderStorage;
use crate::message::MessageBus;

/// Command execution and queries over the order store
#[derive(Clone)]
pub struct OrdersManager {
    storage: OrderStorage,
    bus: MessageBus,
    /// Tax rate in percent applied at order creation
    tax_rate_percent: f64,
}

impl OrdersManager {
    pub fn new(
        db_path: impl AsRef<Path>,
        bus: MessageBus,
        tax_rate_percent: f64,
    ) -> ManagerResult<Self> {
        let storage = OrderStorage::open(db_path)?;
        Ok(Self {
            storage,
            bus,
            tax_rate_percent,
        })
    }

    #[cfg(test)]
    pub fn new_in_memory(bus: MessageBus, tax_rate_percent: f64) -> ManagerResult<Self> {
        Ok(Self {
            storage: OrderStorage::open_in_memory()?,
            bus,
            tax_rate_percent,
        })
    }

    pub fn storage(&self) -> &OrderStorage {
        &self.storage
    }

    pub fn tax_rate_percent(&self) -> f64 {
        self.tax_rate_percent
    }

    /// Execute a command against the store
    ///
    /// A replayed `command_id` returns the order the first execution
    /// produced instead of re-applying the command.
    pub fn execute(&self, action: CommandAction, metadata: CommandMetadata) -> ManagerResult<Order> {
        self.execute_with_outcome(action, metadata)
            .map(|(order, _)| order)
    }

    /// Like [`execute`](Self::execute), additionally returning any
    /// non-fatal sub-step failure (the refund leg of a cancel) so the
    /// caller can surface it alongside the committed order. Replays
    /// carry no warning.
    pub fn execute_with_outcome(
        &self,
        action: CommandAction,
        metadata: CommandMetadata,
    ) -> ManagerResult<(Order, Option<String>)> {
        if let Some(command_id) = &metadata.command_id {
            if let Some(order_id) = self.storage.get_processed_command(command_id)? {
                info!(command_id, order_id, "duplicate command, returning stored outcome");
                return Ok((self.get_order(&order_id)?, None));
            }
        }

        let is_create = matches!(action, CommandAction::CreateOrder(_));
        let txn = self.storage.begin_write()?;

        if let Some(command_id) = &metadata.command_id {
            // Re-check inside the transaction
            if let Some(order_id) = self.storage.get_processed_command_txn(&txn, command_id)? {
                drop(txn);
                return Ok((self.get_order(&order_id)?, None));
            }
        }

        let now = now_millis();
        let mut ctx = CommandContext::new(&txn, &self.storage, now);
        let mut order = action.execute(&mut ctx)?;
        let warning = ctx.warning.take();

        if let Some(expected) = metadata.expected_version {
            if expected != order.version {
                return Err(ManagerError::ConcurrencyConflict {
                    entity_id: order.id,
                    expected,
                    found: order.version,
                });
            }
        }

        order.version += 1;
        order.updated_at = now;
        self.storage.put_order(&txn, &order)?;
        if self.is_active(&order) {
            self.storage.mark_order_active(&txn, &order)?;
        } else {
            self.storage.mark_order_inactive(&txn, &order)?;
        }

        if let Some(command_id) = &metadata.command_id {
            self.storage.mark_command_processed(&txn, command_id, &order.id)?;
        }
        txn.commit().map_err(super::storage::StorageError::from)?;

        info!(
            action = action.name(),
            order_id = %order.id,
            order_number = order.order_number,
            version = order.version,
            "command executed"
        );

        let change = if is_create {
            ChangeKind::Created
        } else {
            ChangeKind::Updated
        };
        self.bus
            .publish_change(&order.restaurant_id, ChangedEntity::Order, &order.id, change);

        Ok((order, warning))
    }

    /// Orders stay on dashboards until cancelled or served-and-settled.
    /// A served-but-unpaid order is deliberately kept active: it blocks
    /// table release and staff must see it.
    fn is_active(&self, order: &Order) -> bool {
        match order.order_status {
            OrderStatus::Cancelled => false,
            OrderStatus::Served => matches!(
                order.payment_status,
                PaymentStatus::Pending | PaymentStatus::Failed
            ),
            _ => true,
        }
    }

    // ========== Queries ==========

    pub fn get_order(&self, order_id: &str) -> ManagerResult<Order> {
        self.storage
            .get_order(order_id)?
            .ok_or_else(|| super::actions::OrderError::OrderNotFound(order_id.to_string()).into())
    }

    /// Customer-facing lookup by unguessable token
    pub fn get_order_by_token(&self, token: &str) -> ManagerResult<Order> {
        self.storage
            .find_order_by_token(token)?
            .ok_or_else(|| super::actions::OrderError::OrderNotFound(token.to_string()).into())
    }

    pub fn list_active_orders(&self, restaurant_id: &str) -> ManagerResult<Vec<Order>> {
        Ok(self.storage.get_active_orders(restaurant_id)?)
    }

    pub fn payments_for_order(&self, order_id: &str) -> ManagerResult<Vec<PaymentEntry>> {
        Ok(self.storage.get_payments_for_order(order_id)?)
    }

    pub fn get_complaint(&self, complaint_id: &str) -> ManagerResult<Complaint> {
        self.storage
            .get_complaint(complaint_id)?
            .ok_or_else(|| ManagerError::ComplaintNotFound(complaint_id.to_string()))
    }

    // ========== Complaints ==========

    /// File a complaint against an order
    pub fn file_complaint(&self, order_id: &str, description: &str) -> ManagerResult<Complaint> {
        if description.trim().is_empty() {
            return Err(super::actions::OrderError::InvalidOperation(
                "complaint requires a description".to_string(),
            )
            .into());
        }
        let order = self.get_order(order_id)?;

        let complaint = Complaint {
            id: Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            restaurant_id: order.restaurant_id.clone(),
            description: description.to_string(),
            status: ComplaintStatus::Open,
            created_at: now_millis(),
            resolved_at: None,
        };
        let txn = self.storage.begin_write()?;
        self.storage.put_complaint(&txn, &complaint)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        self.bus.publish_change(
            &complaint.restaurant_id,
            ChangedEntity::Complaint,
            &complaint.id,
            ChangeKind::Created,
        );
        Ok(complaint)
    }

    /// Resolve a complaint; order state is never touched
    pub fn resolve_complaint(&self, complaint_id: &str) -> ManagerResult<Complaint> {
        let txn = self.storage.begin_write()?;
        let mut complaint = self
            .storage
            .get_complaint_txn(&txn, complaint_id)?
            .ok_or_else(|| ManagerError::ComplaintNotFound(complaint_id.to_string()))?;

        if complaint.status != ComplaintStatus::Resolved {
            complaint.status = ComplaintStatus::Resolved;
            complaint.resolved_at = Some(now_millis());
            self.storage.put_complaint(&txn, &complaint)?;
        }
        txn.commit().map_err(super::storage::StorageError::from)?;

        self.bus.publish_change(
            &complaint.restaurant_id,
            ChangedEntity::Complaint,
            &complaint.id,
            ChangeKind::Updated,
        );
        Ok(complaint)
    }

    // ========== Ephemeral broadcasts ==========

    /// "Call waiter" button: broadcast only, nothing persisted
    pub fn call_waiter(&self, restaurant_id: &str, table_number: &str) {
        self.bus.publish_ephemeral(
            restaurant_id,
            EphemeralKind::CallWaiter {
                table_number: table_number.to_string(),
            },
        );
    }

    /// Customer asks to settle in cash; staff confirm via ConfirmCashPayment
    pub fn request_cash(&self, order_id: &str) -> ManagerResult<()> {
        let order = self.get_order(order_id)?;
        self.bus.publish_ephemeral(
            &order.restaurant_id,
            EphemeralKind::CashRequested {
                order_id: order.id,
                amount: order.total,
            },
        );
        Ok(())
    }
}

//! Session/table binder
//!
//! Ties a physical table to at most one active ordering session. Sessions
//! are created lazily: the first order (or an explicit "seat customer"
//! action) calls [`SessionBinder::get_or_create_active_session`], which
//! claims the table's active-session slot inside a write transaction.
//! Racing callers converge on the first writer's session id.
//!
//! Release is guarded: a table with served-but-unpaid orders cannot be
//! freed, and the rejection carries the blocking order numbers and their
//! total so staff can settle them.

use serde_json::json;
use shared::error::{AppError, ErrorCode};
use shared::message::{ChangeKind, ChangedEntity};
use shared::models::{
    DiningTable, Order, OrderStatus, PaymentStatus, SessionStatus, TableSession, TableStatus,
};
use shared::util::now_millis;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::message::MessageBus;
use crate::orders::storage::{OrderStorage, StorageError};

/// An order blocking table release
#[derive(Debug, Clone, serde::Serialize)]
pub struct BlockingOrder {
    pub order_number: u64,
    pub total: f64,
}

/// Binder errors
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Table has {} served but unpaid order(s)", .0.len())]
    UnpaidOrdersExist(Vec<BlockingOrder>),
}

pub type TableResult<T> = Result<T, TableError>;

impl From<TableError> for AppError {
    fn from(err: TableError) -> Self {
        match err {
            TableError::Storage(e) => {
                tracing::error!(error = %e, "storage error");
                AppError::database(e.to_string())
            }
            TableError::TableNotFound(id) => AppError::not_found(format!("table {}", id)),
            TableError::SessionNotFound(id) => {
                AppError::with_message(ErrorCode::SessionNotFound, format!("Session not found: {}", id))
            }
            TableError::UnpaidOrdersExist(blocking) => {
                let total: f64 = blocking.iter().map(|b| b.total).sum();
                AppError::with_message(
                    ErrorCode::UnpaidOrdersExist,
                    format!(
                        "{} served order(s) are unpaid (total {:.2})",
                        blocking.len(),
                        total
                    ),
                )
                .with_detail("blocking_orders", json!(blocking))
                .with_detail("blocking_total", json!(total))
            }
        }
    }
}

/// Binds tables to active sessions
#[derive(Clone)]
pub struct SessionBinder {
    storage: OrderStorage,
    bus: MessageBus,
}

impl SessionBinder {
    pub fn new(storage: OrderStorage, bus: MessageBus) -> Self {
        Self { storage, bus }
    }

    /// Register a physical table
    pub fn register_table(&self, restaurant_id: &str, table_number: &str) -> TableResult<DiningTable> {
        let table = DiningTable {
            id: Uuid::new_v4().to_string(),
            restaurant_id: restaurant_id.to_string(),
            table_number: table_number.to_string(),
            status: TableStatus::Available,
            booked_at: None,
        };
        let txn = self.storage.begin_write()?;
        self.storage.put_table(&txn, &table)?;
        txn.commit().map_err(StorageError::from)?;

        self.bus.publish_change(
            restaurant_id,
            ChangedEntity::Table,
            &table.id,
            ChangeKind::Created,
        );
        Ok(table)
    }

    pub fn get_table(&self, table_id: &str) -> TableResult<DiningTable> {
        self.storage
            .get_table(table_id)?
            .ok_or_else(|| TableError::TableNotFound(table_id.to_string()))
    }

    pub fn get_session(&self, session_id: &str) -> TableResult<TableSession> {
        self.storage
            .get_session(session_id)?
            .ok_or_else(|| TableError::SessionNotFound(session_id.to_string()))
    }

    /// Get the table's active session id, creating the session lazily
    ///
    /// The claim on the active-session slot happens inside the write
    /// transaction, so of N concurrent callers exactly one inserts; the
    /// rest observe the winner's id and return it.
    pub fn get_or_create_active_session(&self, table_id: &str) -> TableResult<String> {
        let txn = self.storage.begin_write()?;
        let mut table = self
            .storage
            .get_table_txn(&txn, table_id)?
            .ok_or_else(|| TableError::TableNotFound(table_id.to_string()))?;

        let session = TableSession {
            id: Uuid::new_v4().to_string(),
            table_id: table_id.to_string(),
            restaurant_id: table.restaurant_id.clone(),
            status: SessionStatus::Active,
            booked_at: now_millis(),
            closed_at: None,
        };
        match self
            .storage
            .claim_active_session(&txn, table_id, &session.id)?
        {
            Err(existing) => {
                // Lost the race (or the table was already occupied)
                drop(txn);
                return Ok(existing);
            }
            Ok(()) => {}
        }

        self.storage.put_session(&txn, &session)?;
        table.status = TableStatus::Occupied;
        table.booked_at = Some(session.booked_at);
        self.storage.put_table(&txn, &table)?;
        txn.commit().map_err(StorageError::from)?;

        info!(table_id, session_id = %session.id, "table session opened");
        self.bus.publish_change(
            &session.restaurant_id,
            ChangedEntity::Session,
            &session.id,
            ChangeKind::Created,
        );
        self.bus.publish_change(
            &table.restaurant_id,
            ChangedEntity::Table,
            &table.id,
            ChangeKind::Updated,
        );
        Ok(session.id)
    }

    /// Close a session and free its table
    ///
    /// Rejected while any served order in the session is still unpaid;
    /// the error carries the blocking order numbers and amounts.
    pub fn end_session(&self, session_id: &str) -> TableResult<TableSession> {
        let txn = self.storage.begin_write()?;
        let mut session = self
            .storage
            .get_session(session_id)?
            .ok_or_else(|| TableError::SessionNotFound(session_id.to_string()))?;
        if session.status == SessionStatus::Closed {
            return Ok(session);
        }

        let orders = self.storage.get_orders_for_session_txn(&txn, session_id)?;
        let blocking = served_unpaid(&orders);
        if !blocking.is_empty() {
            return Err(TableError::UnpaidOrdersExist(blocking));
        }

        session.status = SessionStatus::Closed;
        session.closed_at = Some(now_millis());
        self.storage.put_session(&txn, &session)?;
        self.storage.clear_active_session(&txn, &session.table_id)?;

        let table = self.storage.get_table_txn(&txn, &session.table_id)?;
        if let Some(mut table) = table {
            table.status = TableStatus::Available;
            table.booked_at = None;
            self.storage.put_table(&txn, &table)?;
        }
        txn.commit().map_err(StorageError::from)?;

        info!(session_id, table_id = %session.table_id, "table session closed");
        self.bus.publish_change(
            &session.restaurant_id,
            ChangedEntity::Session,
            &session.id,
            ChangeKind::Updated,
        );
        self.bus.publish_change(
            &session.restaurant_id,
            ChangedEntity::Table,
            &session.table_id,
            ChangeKind::Updated,
        );
        Ok(session)
    }

    /// Force-release a table by id, closing its active session if any
    ///
    /// Same unpaid-order guard as [`end_session`](Self::end_session); a
    /// table without an active session is simply marked available.
    pub fn force_release_table(&self, table_id: &str) -> TableResult<()> {
        match self.storage.get_active_session_id(table_id)? {
            Some(session_id) => {
                self.end_session(&session_id)?;
            }
            None => {
                let txn = self.storage.begin_write()?;
                let Some(mut table) = self.storage.get_table_txn(&txn, table_id)? else {
                    return Err(TableError::TableNotFound(table_id.to_string()));
                };
                table.status = TableStatus::Available;
                table.booked_at = None;
                self.storage.put_table(&txn, &table)?;
                txn.commit().map_err(StorageError::from)?;
                self.bus.publish_change(
                    &table.restaurant_id,
                    ChangedEntity::Table,
                    table_id,
                    ChangeKind::Updated,
                );
            }
        }
        Ok(())
    }
}

fn served_unpaid(orders: &[Order]) -> Vec<BlockingOrder> {
    orders
        .iter()
        .filter(|o| {
            o.order_status == OrderStatus::Served
                && matches!(
                    o.payment_status,
                    PaymentStatus::Pending | PaymentStatus::Failed
                )
        })
        .map(|o| BlockingOrder {
            order_number: o.order_number,
            total: o.total,
        })
        .collect()
}

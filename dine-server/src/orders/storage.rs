//! redb-based storage layer for orders, payments, sessions, and complaints
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` | Order aggregates |
//! | `order_tokens` | `order_token` | `order_id` | Customer-facing lookup |
//! | `active_orders` | `(restaurant_id, order_id)` | `()` | Dashboard index |
//! | `payments` | `(order_id, payment_id)` | `PaymentEntry` | Payment ledger |
//! | `sessions` | `session_id` | `TableSession` | Table sessions |
//! | `active_sessions` | `table_id` | `session_id` | One-active-per-table index |
//! | `tables` | `table_id` | `DiningTable` | Physical tables |
//! | `complaints` | `complaint_id` | `Complaint` | Order complaints |
//! | `processed_commands` | `command_id` | `order_id` | Idempotency / replay lookup |
//! | `counters` | `restaurant_id` | `u64` | Per-restaurant order numbers |
//!
//! # Atomicity
//!
//! Every multi-step operation (refund + ledger update, item-status cascade,
//! split settlement) runs inside a single write transaction, so the two
//! records either both change or neither does. redb commits are durable as
//! soon as `commit()` returns (copy-on-write with atomic pointer swap),
//! which keeps the store consistent across unexpected shutdowns.
//!
//! # Active-session uniqueness
//!
//! The `active_sessions` table is the uniqueness constraint behind the
//! "at most one active session per table" invariant: creation goes through
//! [`OrderStorage::claim_active_session`], which refuses to overwrite an
//! existing entry, so racing creators converge on the first writer's id.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::models::{Complaint, DiningTable, Order, PaymentEntry, TableSession};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");
const ORDER_TOKENS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("order_tokens");
const ACTIVE_ORDERS_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("active_orders");
const PAYMENTS_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("payments");
const SESSIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");
const ACTIVE_SESSIONS_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("active_sessions");
const TABLES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("tables");
const COMPLAINTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("complaints");
const PROCESSED_COMMANDS_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("processed_commands");
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Order storage backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
}

impl OrderStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_TOKENS_TABLE)?;
            let _ = write_txn.open_table(ACTIVE_ORDERS_TABLE)?;
            let _ = write_txn.open_table(PAYMENTS_TABLE)?;
            let _ = write_txn.open_table(SESSIONS_TABLE)?;
            let _ = write_txn.open_table(ACTIVE_SESSIONS_TABLE)?;
            let _ = write_txn.open_table(TABLES_TABLE)?;
            let _ = write_txn.open_table(COMPLAINTS_TABLE)?;
            let _ = write_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
            let _ = write_txn.open_table(COUNTERS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Order Counter ==========

    /// Allocate the next sequential order number for a restaurant
    ///
    /// Runs inside the caller's transaction so a failed order creation
    /// does not burn a number.
    pub fn next_order_number(
        &self,
        txn: &WriteTransaction,
        restaurant_id: &str,
    ) -> StorageResult<u64> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table.get(restaurant_id)?.map(|g| g.value()).unwrap_or(100);
        let next = current + 1;
        table.insert(restaurant_id, next)?;
        Ok(next)
    }

    // ========== Command Idempotency ==========

    /// Get the order id a processed command produced, if any
    pub fn get_processed_command(&self, command_id: &str) -> StorageResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.map(|g| g.value().to_string()))
    }

    /// Get the order id a processed command produced (within transaction)
    pub fn get_processed_command_txn(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<Option<String>> {
        let table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.map(|g| g.value().to_string()))
    }

    /// Mark a command as processed, recording the order it touched
    pub fn mark_command_processed(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
        order_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        table.insert(command_id, order_id)?;
        Ok(())
    }

    // ========== Order Operations ==========

    /// Store an order (insert or overwrite)
    pub fn put_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Register the customer-facing token for an order
    pub fn put_order_token(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDER_TOKENS_TABLE)?;
        table.insert(order.order_token.as_str(), order.id.as_str())?;
        Ok(())
    }

    /// Get an order by id (read-only)
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get an order by id (within transaction)
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Look up an order by its customer-facing token
    pub fn find_order_by_token(&self, token: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let tokens = read_txn.open_table(ORDER_TOKENS_TABLE)?;
        let Some(id_guard) = tokens.get(token)? else {
            return Ok(None);
        };
        let orders = read_txn.open_table(ORDERS_TABLE)?;
        match orders.get(id_guard.value())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Mark an order as active (visible on dashboards)
    pub fn mark_order_active(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ACTIVE_ORDERS_TABLE)?;
        table.insert((order.restaurant_id.as_str(), order.id.as_str()), ())?;
        Ok(())
    }

    /// Remove an order from the active index
    pub fn mark_order_inactive(
        &self,
        txn: &WriteTransaction,
        order: &Order,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(ACTIVE_ORDERS_TABLE)?;
        table.remove((order.restaurant_id.as_str(), order.id.as_str()))?;
        Ok(())
    }

    /// Get all active orders for a restaurant
    pub fn get_active_orders(&self, restaurant_id: &str) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let active = read_txn.open_table(ACTIVE_ORDERS_TABLE)?;
        let orders_table = read_txn.open_table(ORDERS_TABLE)?;

        let range_start = (restaurant_id, "");
        let range_end = (restaurant_id, "\u{10ffff}");

        let mut orders = Vec::new();
        for result in active.range(range_start..=range_end)? {
            let (key, _) = result?;
            let (_, order_id) = key.value();
            if let Some(value) = orders_table.get(order_id)? {
                orders.push(serde_json::from_slice(value.value())?);
            }
        }
        orders.sort_by_key(|o: &Order| o.created_at);
        Ok(orders)
    }

    /// Get all orders bound to a session (within transaction)
    ///
    /// Full scan of the orders table; order volume per store is small and
    /// this only runs on session release.
    pub fn get_orders_for_session_txn(
        &self,
        txn: &WriteTransaction,
        session_id: &str,
    ) -> StorageResult<Vec<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let order: Order = serde_json::from_slice(value.value())?;
            if order.session_id.as_deref() == Some(session_id) {
                orders.push(order);
            }
        }
        Ok(orders)
    }

    // ========== Payment Ledger ==========

    /// Store a ledger entry
    pub fn put_payment(&self, txn: &WriteTransaction, entry: &PaymentEntry) -> StorageResult<()> {
        let mut table = txn.open_table(PAYMENTS_TABLE)?;
        let value = serde_json::to_vec(entry)?;
        table.insert(
            (entry.order_id.as_str(), entry.payment_id.as_str()),
            value.as_slice(),
        )?;
        Ok(())
    }

    /// Get all ledger entries for an order (read-only)
    pub fn get_payments_for_order(&self, order_id: &str) -> StorageResult<Vec<PaymentEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PAYMENTS_TABLE)?;
        let mut entries = Vec::new();
        for result in table.range((order_id, "")..=(order_id, "\u{10ffff}"))? {
            let (_, value) = result?;
            entries.push(serde_json::from_slice(value.value())?);
        }
        Ok(entries)
    }

    /// Get all ledger entries for an order (within transaction)
    pub fn get_payments_for_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Vec<PaymentEntry>> {
        let table = txn.open_table(PAYMENTS_TABLE)?;
        let mut entries = Vec::new();
        for result in table.range((order_id, "")..=(order_id, "\u{10ffff}"))? {
            let (_, value) = result?;
            entries.push(serde_json::from_slice(value.value())?);
        }
        Ok(entries)
    }

    // ========== Table Sessions ==========

    /// Store a session record
    pub fn put_session(&self, txn: &WriteTransaction, session: &TableSession) -> StorageResult<()> {
        let mut table = txn.open_table(SESSIONS_TABLE)?;
        let value = serde_json::to_vec(session)?;
        table.insert(session.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a session by id (read-only)
    pub fn get_session(&self, session_id: &str) -> StorageResult<Option<TableSession>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSIONS_TABLE)?;
        match table.get(session_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get the active session id for a table (within transaction)
    pub fn get_active_session_id_txn(
        &self,
        txn: &WriteTransaction,
        table_id: &str,
    ) -> StorageResult<Option<String>> {
        let table = txn.open_table(ACTIVE_SESSIONS_TABLE)?;
        Ok(table.get(table_id)?.map(|g| g.value().to_string()))
    }

    /// Get the active session id for a table (read-only)
    pub fn get_active_session_id(&self, table_id: &str) -> StorageResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ACTIVE_SESSIONS_TABLE)?;
        Ok(table.get(table_id)?.map(|g| g.value().to_string()))
    }

    /// Claim the active-session slot for a table (first-writer-wins)
    ///
    /// Returns the previously-claimed session id if the slot is already
    /// taken, in which case nothing is written.
    pub fn claim_active_session(
        &self,
        txn: &WriteTransaction,
        table_id: &str,
        session_id: &str,
    ) -> StorageResult<Result<(), String>> {
        let mut table = txn.open_table(ACTIVE_SESSIONS_TABLE)?;
        if let Some(existing) = table.get(table_id)? {
            return Ok(Err(existing.value().to_string()));
        }
        table.insert(table_id, session_id)?;
        Ok(Ok(()))
    }

    /// Clear the active-session slot for a table
    pub fn clear_active_session(
        &self,
        txn: &WriteTransaction,
        table_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(ACTIVE_SESSIONS_TABLE)?;
        table.remove(table_id)?;
        Ok(())
    }

    // ========== Dining Tables ==========

    /// Store a table record
    pub fn put_table(&self, txn: &WriteTransaction, table: &DiningTable) -> StorageResult<()> {
        let mut t = txn.open_table(TABLES_TABLE)?;
        let value = serde_json::to_vec(table)?;
        t.insert(table.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a table by id (read-only)
    pub fn get_table(&self, table_id: &str) -> StorageResult<Option<DiningTable>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLES_TABLE)?;
        match table.get(table_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a table by id (within transaction)
    pub fn get_table_txn(
        &self,
        txn: &WriteTransaction,
        table_id: &str,
    ) -> StorageResult<Option<DiningTable>> {
        let table = txn.open_table(TABLES_TABLE)?;
        match table.get(table_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    // ========== Complaints ==========

    /// Store a complaint
    pub fn put_complaint(&self, txn: &WriteTransaction, complaint: &Complaint) -> StorageResult<()> {
        let mut table = txn.open_table(COMPLAINTS_TABLE)?;
        let value = serde_json::to_vec(complaint)?;
        table.insert(complaint.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a complaint by id (read-only)
    pub fn get_complaint(&self, complaint_id: &str) -> StorageResult<Option<Complaint>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COMPLAINTS_TABLE)?;
        match table.get(complaint_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a complaint by id (within transaction)
    pub fn get_complaint_txn(
        &self,
        txn: &WriteTransaction,
        complaint_id: &str,
    ) -> StorageResult<Option<Complaint>> {
        let table = txn.open_table(COMPLAINTS_TABLE)?;
        match table.get(complaint_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }
}

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use super::super::actions::OrderError;
use super::super::storage::StorageError;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("Version conflict on {entity_id}: expected {expected}, found {found}")]
    ConcurrencyConflict {
        entity_id: String,
        expected: u64,
        found: u64,
    },

    #[error("Complaint not found: {0}")]
    ComplaintNotFound(String),
}

pub type ManagerResult<T> = Result<T, ManagerError>;

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::Storage(e) => {
                tracing::error!(error = %e, "storage error");
                AppError::database(e.to_string())
            }
            ManagerError::Order(e) => order_error_to_app(e),
            ManagerError::ConcurrencyConflict {
                entity_id,
                expected,
                found,
            } => AppError::conflict(format!(
                "Version conflict on {}: expected {}, found {}",
                entity_id, expected, found
            )),
            ManagerError::ComplaintNotFound(id) => {
                AppError::not_found(format!("complaint {}", id))
            }
        }
    }
}

fn order_error_to_app(err: OrderError) -> AppError {
    let code = match &err {
        OrderError::OrderNotFound(_) => ErrorCode::OrderNotFound,
        OrderError::ItemNotFound(_) => ErrorCode::ItemNotFound,
        OrderError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
        OrderError::AlreadyCancelled => ErrorCode::OrderAlreadyCancelled,
        OrderError::InvalidOperation(_) => ErrorCode::InvalidRequest,
        OrderError::DiscountExceedsTotal { .. } => ErrorCode::DiscountExceedsTotal,
        OrderError::RefundExceedsPaid { .. } => ErrorCode::RefundExceedsPaid,
        OrderError::SplitMismatch { .. } => ErrorCode::SplitMismatch,
        OrderError::PartialReconciliation(_) => ErrorCode::PartialReconciliation,
        OrderError::Storage(_) => ErrorCode::DatabaseError,
    };
    AppError::with_message(code, err.to_string())
}

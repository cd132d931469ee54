//! Unified error codes for dine-server
//!
//! Error codes are shared between the server and its dashboard clients.
//! They are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order lifecycle errors
//! - 5xxx: Payment errors
//! - 7xxx: Table/session errors
//! - 9xxx: System errors

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Represented as u16 for efficient serialization and cross-language
/// compatibility (Rust, TypeScript).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed (malformed or missing input; never retried)
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Line item not found in the order's item list
    ItemNotFound = 4002,
    /// Attempted state change violates the order lifecycle
    InvalidTransition = 4003,
    /// Order is already cancelled
    OrderAlreadyCancelled = 4004,
    /// Discount exceeds the order total
    DiscountExceedsTotal = 4005,

    // ==================== 5xxx: Payment ====================
    /// Provider-side failure (surfaced with retry affordance)
    GatewayError = 5001,
    /// Gateway is disabled for this restaurant
    GatewayDisabled = 5002,
    /// Server-side payment verification failed
    VerificationFailed = 5003,
    /// Refund exceeds recorded payments or order total
    RefundExceedsPaid = 5004,
    /// Split legs do not add up to the order total
    SplitMismatch = 5005,
    /// Order/ledger dual-write partially failed (auditing gap)
    PartialReconciliation = 5006,

    // ==================== 7xxx: Table ====================
    /// Table release blocked by served-but-unpaid orders
    UnpaidOrdersExist = 7001,
    /// No active session for the table
    SessionNotFound = 7002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database/storage error
    DatabaseError = 9002,
    /// Optimistic-write predicate failed; re-fetch and retry
    ConcurrencyConflict = 9003,
}

impl ErrorCode {
    /// Numeric code value
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Default human-readable message for this code
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "OK",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",
            Self::OrderNotFound => "Order not found",
            Self::ItemNotFound => "Item not found in order",
            Self::InvalidTransition => "Invalid order state transition",
            Self::OrderAlreadyCancelled => "Order is already cancelled",
            Self::DiscountExceedsTotal => "Discount exceeds order total",
            Self::GatewayError => "Payment gateway error",
            Self::GatewayDisabled => "Payment gateway is disabled",
            Self::VerificationFailed => "Payment verification failed",
            Self::RefundExceedsPaid => "Refund exceeds paid amount",
            Self::SplitMismatch => "Split amounts do not match order total",
            Self::PartialReconciliation => "Payment ledger reconciliation incomplete",
            Self::UnpaidOrdersExist => "Table has unpaid orders",
            Self::SessionNotFound => "No active session for table",
            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::ConcurrencyConflict => "Concurrent modification detected, retry from a fresh read",
        }
    }

    /// HTTP status code mapping
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,
            Self::ValidationFailed | Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::OrderNotFound | Self::ItemNotFound | Self::SessionNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::AlreadyExists => StatusCode::CONFLICT,
            Self::InvalidTransition
            | Self::OrderAlreadyCancelled
            | Self::DiscountExceedsTotal
            | Self::RefundExceedsPaid
            | Self::SplitMismatch
            | Self::UnpaidOrdersExist => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ConcurrencyConflict => StatusCode::CONFLICT,
            Self::GatewayError | Self::VerificationFailed => StatusCode::BAD_GATEWAY,
            Self::GatewayDisabled => StatusCode::SERVICE_UNAVAILABLE,
            Self::PartialReconciliation
            | Self::Unknown
            | Self::InternalError
            | Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Category classification from the code's thousands digit
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => Self::Success,
            1 => Self::Unknown,
            2 => Self::ValidationFailed,
            3 => Self::NotFound,
            4 => Self::AlreadyExists,
            5 => Self::InvalidRequest,
            4001 => Self::OrderNotFound,
            4002 => Self::ItemNotFound,
            4003 => Self::InvalidTransition,
            4004 => Self::OrderAlreadyCancelled,
            4005 => Self::DiscountExceedsTotal,
            5001 => Self::GatewayError,
            5002 => Self::GatewayDisabled,
            5003 => Self::VerificationFailed,
            5004 => Self::RefundExceedsPaid,
            5005 => Self::SplitMismatch,
            5006 => Self::PartialReconciliation,
            7001 => Self::UnpaidOrdersExist,
            7002 => Self::SessionNotFound,
            9001 => Self::InternalError,
            9002 => Self::DatabaseError,
            9003 => Self::ConcurrencyConflict,
            other => return Err(format!("Unknown error code: {}", other)),
        };
        Ok(code)
    }
}

/// Error category classification based on error code ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Order lifecycle errors (4xxx)
    Order,
    /// Payment errors (5xxx)
    Payment,
    /// Table/session errors (7xxx)
    Table,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            4000..5000 => Self::Order,
            5000..6000 => Self::Payment,
            7000..8000 => Self::Table,
            _ => Self::System,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for code in [
            ErrorCode::ValidationFailed,
            ErrorCode::InvalidTransition,
            ErrorCode::ConcurrencyConflict,
            ErrorCode::UnpaidOrdersExist,
            ErrorCode::PartialReconciliation,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()).unwrap(), code);
        }
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert!(ErrorCode::try_from(12345).is_err());
    }

    #[test]
    fn test_categories() {
        assert_eq!(ErrorCode::ItemNotFound.category(), ErrorCategory::Order);
        assert_eq!(ErrorCode::SplitMismatch.category(), ErrorCategory::Payment);
        assert_eq!(ErrorCode::UnpaidOrdersExist.category(), ErrorCategory::Table);
        assert_eq!(
            ErrorCode::ConcurrencyConflict.category(),
            ErrorCategory::System
        );
    }

    #[test]
    fn test_http_status() {
        assert_eq!(
            ErrorCode::OrderNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCode::InvalidTransition.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::ConcurrencyConflict.http_status(),
            StatusCode::CONFLICT
        );
    }
}

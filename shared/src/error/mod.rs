//! Unified error handling
//!
//! Structured error codes shared between server and dashboard clients,
//! the `AppError` type that crosses the API boundary, and the
//! `ApiResponse` envelope.

mod codes;
mod types;

pub use codes::{ErrorCategory, ErrorCode};
pub use types::{ApiResponse, AppError, AppResult};

//! Shared types for the dine-server workspace
//!
//! Domain models, error types, response structures, and realtime message
//! payloads used by the server and its clients.

pub mod error;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use message::{ChangeEvent, EphemeralEvent};

//! Payment API
//!
//! Checkout initiation talks to the gateway only; nothing is persisted
//! until `verify` succeeds and feeds the MarkPaid command.

mod handler;

use axum::{Router, routing::post};

use crate::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/payments", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(handler::checkout))
        .route("/verify", post(handler::verify))
}

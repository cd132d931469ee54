//! HTTP API
//!
//! One module per resource, each with a `router()` and a `handler` file:
//!
//! - [`health`] - liveness and configured providers
//! - [`orders`] - order lifecycle commands and queries
//! - [`payments`] - gateway checkout and verification
//! - [`tables`] - tables and session binding
//! - [`complaints`] - order-linked complaints
//! - [`stream`] - SSE change and ephemeral streams

pub mod complaints;
pub mod health;
pub mod orders;
pub mod payments;
pub mod stream;
pub mod tables;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::server::AppState;

/// Assemble the full application router
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(payments::router())
        .merge(tables::router())
        .merge(complaints::router())
        .merge(stream::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

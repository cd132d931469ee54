//! Order API
//!
//! All mutations go through `OrdersManager::execute`; handlers only
//! translate payloads and surface `AppError` responses.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::create))
        .route("/active", get(handler::list_active))
        .route("/token/{token}", get(handler::get_by_token))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/payments", get(handler::list_payments))
        .route("/{id}/items/{menu_item_id}/status", post(handler::update_item_status))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/discount", post(handler::apply_discount))
        .route("/{id}/refund", post(handler::refund))
        .route("/{id}/split", post(handler::settle_split))
        .route("/{id}/confirm-cash", post(handler::confirm_cash))
        .route("/{id}/request-cash", post(handler::request_cash))
}

//! Table and session API

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/api/tables", routes())
        .route("/api/sessions/{id}", get(handler::get_session))
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::register))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/session", post(handler::get_or_create_session))
        .route("/{id}/release", post(handler::force_release))
        .route("/{id}/call-waiter", post(handler::call_waiter))
}

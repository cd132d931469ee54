//! Complaint API

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/complaints", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::open))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/resolve", post(handler::resolve))
}

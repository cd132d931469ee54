//! Health check

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    environment: String,
    /// Configured payment providers (availability is probed separately)
    providers: Vec<String>,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        providers: state
            .gateways
            .providers()
            .into_iter()
            .map(String::from)
            .collect(),
    })
}

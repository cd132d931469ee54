//! Complaint API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::error::{AppError, AppResult};
use shared::models::Complaint;
use validator::Validate;

use crate::server::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct OpenComplaintRequest {
    #[validate(length(min = 1))]
    pub order_id: String,
    #[validate(length(min = 1, message = "complaint requires a description"))]
    pub description: String,
}

pub async fn open(
    State(state): State<AppState>,
    Json(payload): Json<OpenComplaintRequest>,
) -> AppResult<Json<Complaint>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let complaint = state
        .orders
        .file_complaint(&payload.order_id, &payload.description)?;
    Ok(Json(complaint))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Complaint>> {
    Ok(Json(state.orders.get_complaint(&id)?))
}

/// Idempotent: resolving twice is a no-op
pub async fn resolve(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Complaint>> {
    Ok(Json(state.orders.resolve_complaint(&id)?))
}

//! Table and session API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult};
use shared::models::{DiningTable, TableSession};
use validator::Validate;

use crate::server::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterTableRequest {
    #[validate(length(min = 1))]
    pub restaurant_id: String,
    #[validate(length(min = 1))]
    pub table_number: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterTableRequest>,
) -> AppResult<Json<DiningTable>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let table = state
        .tables
        .register_table(&payload.restaurant_id, &payload.table_number)?;
    Ok(Json(table))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DiningTable>> {
    Ok(Json(state.tables.get_table(&id)?))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<TableSession>> {
    Ok(Json(state.tables.get_session(&id)?))
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: String,
}

/// Idempotent: the second scan at an occupied table joins the existing
/// session instead of opening a new one
pub async fn get_or_create_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<SessionResponse>> {
    let session_id = state.tables.get_or_create_active_session(&id)?;
    Ok(Json(SessionResponse { session_id }))
}

/// Blocked while the table has served-but-unpaid orders; the error lists
/// them with order numbers and totals
pub async fn force_release(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    state.tables.force_release_table(&id)?;
    Ok(Json(serde_json::json!({ "released": true })))
}

pub async fn call_waiter(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let table = state.tables.get_table(&id)?;
    state
        .orders
        .call_waiter(&table.restaurant_id, &table.table_number);
    Ok(Json(serde_json::json!({ "called": true })))
}

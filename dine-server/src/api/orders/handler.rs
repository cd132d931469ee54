//! Order API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult};
use shared::models::{
    CustomerInfo, DiscountKind, ItemStatus, Order, OrderType, PaymentEntry, PaymentMethod,
};
use validator::Validate;

use crate::orders::actions::{
    ApplyDiscountAction, CancelOrderAction, CommandAction, CommandMetadata,
    ConfirmCashPaymentAction, CreateOrderAction, OrderItemInput, RefundAction, SettleSplitAction,
    UpdateItemStatusAction,
};
use crate::server::AppState;

/// Idempotency and concurrency fields carried by every mutating request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandEnvelope {
    pub command_id: Option<String>,
    /// Version the caller last observed
    pub expected_version: Option<u64>,
}

impl CommandEnvelope {
    fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            command_id: self.command_id.clone(),
            expected_version: self.expected_version,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1))]
    pub restaurant_id: String,
    #[serde(default)]
    pub order_type: OrderType,
    pub table_id: Option<String>,
    pub table_number: Option<String>,
    pub session_id: Option<String>,
    #[serde(default)]
    pub customer: CustomerInfo,
    pub special_instructions: Option<String>,
    #[validate(length(min = 1, message = "order must contain at least one item"))]
    pub items: Vec<OrderItemInput>,
    pub payment_method: PaymentMethod,
    #[serde(flatten)]
    pub envelope: CommandEnvelope,
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<Order>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let metadata = payload.envelope.metadata();
    let order = state.orders.execute(
        CommandAction::CreateOrder(CreateOrderAction {
            restaurant_id: payload.restaurant_id,
            order_type: payload.order_type,
            table_id: payload.table_id,
            table_number: payload.table_number,
            session_id: payload.session_id,
            customer: payload.customer,
            special_instructions: payload.special_instructions,
            items: payload.items,
            payment_method: payload.payment_method,
            tax_rate_percent: state.orders.tax_rate_percent(),
        }),
        metadata,
    )?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
pub struct ActiveQuery {
    pub restaurant_id: String,
}

pub async fn list_active(
    State(state): State<AppState>,
    Query(query): Query<ActiveQuery>,
) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(state.orders.list_active_orders(&query.restaurant_id)?))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.orders.get_order(&id)?))
}

pub async fn get_by_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.orders.get_order_by_token(&token)?))
}

pub async fn list_payments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<PaymentEntry>>> {
    Ok(Json(state.orders.payments_for_order(&id)?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemStatusRequest {
    pub target: ItemStatus,
    #[serde(flatten)]
    pub envelope: CommandEnvelope,
}

pub async fn update_item_status(
    State(state): State<AppState>,
    Path((id, menu_item_id)): Path<(String, String)>,
    Json(payload): Json<UpdateItemStatusRequest>,
) -> AppResult<Json<Order>> {
    let order = state.orders.execute(
        CommandAction::UpdateItemStatus(UpdateItemStatusAction {
            order_id: id,
            menu_item_id,
            target: payload.target,
        }),
        payload.envelope.metadata(),
    )?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CancelRequest {
    #[validate(length(min = 1, message = "cancellation requires a reason"))]
    pub reason: String,
    pub refund_amount: Option<f64>,
    #[serde(flatten)]
    pub envelope: CommandEnvelope,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    #[serde(flatten)]
    pub order: Order,
    /// Set when a refund requested alongside the cancel did not go
    /// through; the cancellation itself stands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_error: Option<String>,
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CancelRequest>,
) -> AppResult<Json<CancelResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let (order, refund_error) = state.orders.execute_with_outcome(
        CommandAction::CancelOrder(CancelOrderAction {
            order_id: id,
            reason: payload.reason,
            refund_amount: payload.refund_amount,
        }),
        payload.envelope.metadata(),
    )?;
    Ok(Json(CancelResponse {
        order,
        refund_error,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct DiscountRequest {
    pub kind: DiscountKind,
    pub value: f64,
    pub amount: f64,
    pub new_total: f64,
    #[validate(length(min = 1, message = "discount requires a reason"))]
    pub reason: String,
    #[serde(flatten)]
    pub envelope: CommandEnvelope,
}

pub async fn apply_discount(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<DiscountRequest>,
) -> AppResult<Json<Order>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let order = state.orders.execute(
        CommandAction::ApplyDiscount(ApplyDiscountAction {
            order_id: id,
            kind: payload.kind,
            value: payload.value,
            amount: payload.amount,
            new_total: payload.new_total,
            reason: payload.reason,
        }),
        payload.envelope.metadata(),
    )?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefundRequest {
    pub amount: f64,
    #[validate(length(min = 1, message = "refund requires a reason"))]
    pub reason: String,
    #[serde(flatten)]
    pub envelope: CommandEnvelope,
}

pub async fn refund(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RefundRequest>,
) -> AppResult<Json<Order>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let order = state.orders.execute(
        CommandAction::Refund(RefundAction {
            order_id: id,
            amount: payload.amount,
            reason: payload.reason,
        }),
        payload.envelope.metadata(),
    )?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
pub struct SplitRequest {
    pub cash_amount: f64,
    pub online_amount: f64,
    pub provider: Option<String>,
    pub provider_order_ref: Option<String>,
    pub provider_payment_id: Option<String>,
    #[serde(flatten)]
    pub envelope: CommandEnvelope,
}

pub async fn settle_split(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<SplitRequest>,
) -> AppResult<Json<Order>> {
    let order = state.orders.execute(
        CommandAction::SettleSplit(SettleSplitAction {
            order_id: id,
            cash_amount: payload.cash_amount,
            online_amount: payload.online_amount,
            provider: payload.provider,
            provider_order_ref: payload.provider_order_ref,
            provider_payment_id: payload.provider_payment_id,
        }),
        payload.envelope.metadata(),
    )?;
    Ok(Json(order))
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmCashRequest {
    #[serde(flatten)]
    pub envelope: CommandEnvelope,
}

pub async fn confirm_cash(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Option<Json<ConfirmCashRequest>>,
) -> AppResult<Json<Order>> {
    let envelope = payload.map(|Json(p)| p.envelope).unwrap_or_default();
    let order = state.orders.execute(
        CommandAction::ConfirmCashPayment(ConfirmCashPaymentAction { order_id: id }),
        envelope.metadata(),
    )?;
    Ok(Json(order))
}

/// Broadcast-only: asks staff to come collect cash
pub async fn request_cash(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    state.orders.request_cash(&id)?;
    Ok(Json(serde_json::json!({ "requested": true })))
}

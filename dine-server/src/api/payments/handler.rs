//! Payment API handlers

use axum::{Json, extract::State};
use serde::Deserialize;
use shared::error::{AppError, AppResult};
use shared::models::{Order, PaymentStatus};

use crate::orders::actions::{CommandAction, CommandMetadata, MarkPaidAction};
use crate::payments::{CheckoutCompletion, ProviderOrderRef};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub order_id: String,
    pub provider: String,
}

/// Create the provider-side order for a checkout
///
/// Read-only on our side: the order is untouched until verification.
pub async fn checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<ProviderOrderRef>> {
    let order = state.orders.get_order(&payload.order_id)?;
    if !matches!(
        order.payment_status,
        PaymentStatus::Pending | PaymentStatus::Failed
    ) {
        return Err(AppError::invalid_request("order is already settled"));
    }

    let gateway = state.gateways.get(&payload.provider).await?;
    let provider_order = gateway.create_provider_order(&order).await?;
    Ok(Json(provider_order))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub order_id: String,
    pub provider: String,
    pub provider_order_ref: String,
    #[serde(default)]
    pub provider_payment_id: String,
    #[serde(default)]
    pub signature: String,
    pub command_id: Option<String>,
}

/// Verify a completed checkout and settle the order
///
/// The gateway's verdict is the only trusted payment-success source; the
/// ledger entry records the amount the provider reports, not what the
/// client claims.
pub async fn verify(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> AppResult<Json<Order>> {
    let order = state.orders.get_order(&payload.order_id)?;
    let gateway = state.gateways.get(&payload.provider).await?;

    let completion = CheckoutCompletion {
        provider_order_ref: payload.provider_order_ref,
        provider_payment_id: payload.provider_payment_id,
        signature: payload.signature,
    };
    let verified = gateway.verify(&order, &completion).await?;

    let order = state.orders.execute(
        CommandAction::MarkPaid(MarkPaidAction {
            order_id: payload.order_id,
            provider: payload.provider,
            amount: verified.amount,
            provider_order_ref: verified.provider_order_ref,
            provider_payment_id: verified.provider_payment_id,
        }),
        CommandMetadata {
            command_id: payload.command_id,
            expected_version: None,
        },
    )?;
    Ok(Json(order))
}

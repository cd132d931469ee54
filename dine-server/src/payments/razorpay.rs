//! Razorpay gateway (popup checkout)
//!
//! The client SDK opens an in-page widget with our public key and the
//! provider order id. On completion the SDK hands back a payment id and
//! an HMAC-SHA256 signature over `"{order_ref}|{payment_id}"` keyed with
//! the key secret. Verification recomputes the signature and then fetches
//! the payment server-side to confirm the captured amount.

use async_trait::async_trait;
use reqwest::Client;
use ring::hmac;
use serde::Deserialize;
use shared::models::Order;
use tracing::debug;

use super::{
    CheckoutCompletion, CheckoutMode, GatewayError, GatewayResult, PaymentGateway,
    ProviderOrderRef, VerifiedPayment,
};

const API_BASE: &str = "https://api.razorpay.com/v1";

#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    /// Public key, shipped to the client SDK
    pub key_id: String,
    pub key_secret: String,
    /// ISO currency code, e.g. "INR"
    pub currency: String,
}

pub struct RazorpayGateway {
    config: RazorpayConfig,
    client: Client,
    api_base: String,
}

#[derive(Deserialize)]
struct OrderResponse {
    id: String,
}

#[derive(Deserialize)]
struct PaymentResponse {
    /// Amount in minor units
    amount: i64,
    status: String,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> Self {
        Self {
            config,
            client: Client::new(),
            api_base: API_BASE.to_string(),
        }
    }

    fn signing_key(&self) -> hmac::Key {
        hmac::Key::new(hmac::HMAC_SHA256, self.config.key_secret.as_bytes())
    }

    fn check_signature(&self, order_ref: &str, payment_id: &str, signature: &str) -> bool {
        let payload = format!("{}|{}", order_ref, payment_id);
        let Ok(tag) = hex::decode(signature) else {
            return false;
        };
        hmac::verify(&self.signing_key(), payload.as_bytes(), &tag).is_ok()
    }
}

/// Rupees to paise
fn minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn provider(&self) -> &str {
        "razorpay"
    }

    fn checkout_mode(&self) -> CheckoutMode {
        CheckoutMode::Popup
    }

    async fn create_provider_order(&self, order: &Order) -> GatewayResult<ProviderOrderRef> {
        let body = serde_json::json!({
            "amount": minor_units(order.total),
            "currency": self.config.currency,
            "receipt": order.id,
            "notes": { "order_number": order.order_number },
        });

        let response = self
            .client
            .post(format!("{}/orders", self.api_base))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(GatewayError::Provider(format!(
                "order creation returned {}",
                response.status()
            )));
        }
        let created: OrderResponse = response.json().await?;

        debug!(order_id = %order.id, reference = %created.id, "razorpay order created");
        Ok(ProviderOrderRef {
            provider: self.provider().to_string(),
            reference: created.id,
            checkout_mode: CheckoutMode::Popup,
            public_key: Some(self.config.key_id.clone()),
            redirect_url: None,
        })
    }

    async fn verify(
        &self,
        _order: &Order,
        completion: &CheckoutCompletion,
    ) -> GatewayResult<VerifiedPayment> {
        if !self.check_signature(
            &completion.provider_order_ref,
            &completion.provider_payment_id,
            &completion.signature,
        ) {
            return Err(GatewayError::VerificationFailed(
                "signature does not match".to_string(),
            ));
        }

        // Signature binds payment to our provider order; the captured
        // amount still comes from the provider, never from the client.
        let response = self
            .client
            .get(format!(
                "{}/payments/{}",
                self.api_base, completion.provider_payment_id
            ))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(GatewayError::Provider(format!(
                "payment fetch returned {}",
                response.status()
            )));
        }
        let payment: PaymentResponse = response.json().await?;
        if payment.status != "captured" && payment.status != "authorized" {
            return Err(GatewayError::VerificationFailed(format!(
                "payment status is {}",
                payment.status
            )));
        }

        Ok(VerifiedPayment {
            provider_order_ref: completion.provider_order_ref.clone(),
            provider_payment_id: completion.provider_payment_id.clone(),
            amount: payment.amount as f64 / 100.0,
        })
    }

    async fn probe(&self) -> bool {
        if self.config.key_id.is_empty() || self.config.key_secret.is_empty() {
            return false;
        }
        // Any authenticated endpoint works; a 401 means dead credentials
        match self
            .client
            .get(format!("{}/payments?count=1", self.api_base))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .send()
            .await
        {
            Ok(response) => response.status() != reqwest::StatusCode::UNAUTHORIZED,
            Err(_) => false,
        }
    }
}

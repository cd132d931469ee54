//! PhonePe gateway (redirect checkout)
//!
//! Checkout builds a base64 payload, signs it with the X-VERIFY scheme
//! (`sha256(payload + path + salt_key)` plus the salt index) and posts it
//! to the pay endpoint, which returns a hosted page URL to redirect the
//! guest to. Verification never trusts anything relayed through the
//! client redirect: it asks the status API directly.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use shared::models::Order;
use tracing::debug;

use super::{
    CheckoutCompletion, CheckoutMode, GatewayError, GatewayResult, PaymentGateway,
    ProviderOrderRef, VerifiedPayment,
};

const API_BASE: &str = "https://api.phonepe.com/apis/hermes";
const PAY_PATH: &str = "/pg/v1/pay";

#[derive(Debug, Clone)]
pub struct PhonePeConfig {
    pub merchant_id: String,
    pub salt_key: String,
    pub salt_index: u8,
    /// Where the hosted page sends the guest back to
    pub redirect_url: String,
}

pub struct PhonePeGateway {
    config: PhonePeConfig,
    client: Client,
    api_base: String,
}

#[derive(Deserialize)]
struct PayResponse {
    data: PayData,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayData {
    instrument_response: InstrumentResponse,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstrumentResponse {
    redirect_info: RedirectInfo,
}

#[derive(Deserialize)]
struct RedirectInfo {
    url: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    code: String,
    #[serde(default)]
    data: Option<StatusData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusData {
    /// Amount in minor units
    amount: i64,
    #[serde(default)]
    transaction_id: Option<String>,
}

/// X-VERIFY checksum: `sha256(content + salt_key)` hex, then `###` and
/// the salt index
fn x_verify(content: &str, salt_key: &str, salt_index: u8) -> String {
    let digest = Sha256::digest(format!("{}{}", content, salt_key).as_bytes());
    format!("{}###{}", hex::encode(digest), salt_index)
}

/// Provider transaction ids must be alphanumeric
fn transaction_ref(order_id: &str) -> String {
    format!("TX{}", order_id.replace('-', ""))
}

impl PhonePeGateway {
    pub fn new(config: PhonePeConfig) -> Self {
        Self {
            config,
            client: Client::new(),
            api_base: API_BASE.to_string(),
        }
    }
}

#[async_trait]
impl PaymentGateway for PhonePeGateway {
    fn provider(&self) -> &str {
        "phonepe"
    }

    fn checkout_mode(&self) -> CheckoutMode {
        CheckoutMode::Redirect
    }

    async fn create_provider_order(&self, order: &Order) -> GatewayResult<ProviderOrderRef> {
        let reference = transaction_ref(&order.id);
        let payload = serde_json::json!({
            "merchantId": self.config.merchant_id,
            "merchantTransactionId": reference,
            "amount": (order.total * 100.0).round() as i64,
            "redirectUrl": self.config.redirect_url,
            "redirectMode": "REDIRECT",
            "paymentInstrument": { "type": "PAY_PAGE" },
        });
        let encoded = BASE64.encode(payload.to_string());
        let checksum = x_verify(
            &format!("{}{}", encoded, PAY_PATH),
            &self.config.salt_key,
            self.config.salt_index,
        );

        let response = self
            .client
            .post(format!("{}{}", self.api_base, PAY_PATH))
            .header("X-VERIFY", checksum)
            .json(&serde_json::json!({ "request": encoded }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(GatewayError::Provider(format!(
                "pay request returned {}",
                response.status()
            )));
        }
        let pay: PayResponse = response.json().await?;

        debug!(order_id = %order.id, reference, "phonepe transaction created");
        Ok(ProviderOrderRef {
            provider: self.provider().to_string(),
            reference,
            checkout_mode: CheckoutMode::Redirect,
            public_key: None,
            redirect_url: Some(pay.data.instrument_response.redirect_info.url),
        })
    }

    async fn verify(
        &self,
        _order: &Order,
        completion: &CheckoutCompletion,
    ) -> GatewayResult<VerifiedPayment> {
        // The redirect callback is client-relayed and not trusted; the
        // status API is the authority on whether money moved.
        let path = format!(
            "/pg/v1/status/{}/{}",
            self.config.merchant_id, completion.provider_order_ref
        );
        let checksum = x_verify(&path, &self.config.salt_key, self.config.salt_index);

        let response = self
            .client
            .get(format!("{}{}", self.api_base, path))
            .header("X-VERIFY", checksum)
            .header("X-MERCHANT-ID", &self.config.merchant_id)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(GatewayError::Provider(format!(
                "status fetch returned {}",
                response.status()
            )));
        }
        let status: StatusResponse = response.json().await?;

        if status.code != "PAYMENT_SUCCESS" {
            return Err(GatewayError::VerificationFailed(format!(
                "transaction status is {}",
                status.code
            )));
        }
        let data = status.data.ok_or_else(|| {
            GatewayError::Provider("success status without transaction data".to_string())
        })?;

        Ok(VerifiedPayment {
            provider_order_ref: completion.provider_order_ref.clone(),
            provider_payment_id: data
                .transaction_id
                .unwrap_or_else(|| completion.provider_payment_id.clone()),
            amount: data.amount as f64 / 100.0,
        })
    }

    async fn probe(&self) -> bool {
        if self.config.merchant_id.is_empty() || self.config.salt_key.is_empty() {
            return false;
        }
        // Status fetch for a sentinel id; any signed response (even NOT_FOUND)
        // proves the credentials and endpoint are live
        let path = format!("/pg/v1/status/{}/TXPROBE", self.config.merchant_id);
        let checksum = x_verify(&path, &self.config.salt_key, self.config.salt_index);
        match self
            .client
            .get(format!("{}{}", self.api_base, path))
            .header("X-VERIFY", checksum)
            .header("X-MERCHANT-ID", &self.config.merchant_id)
            .send()
            .await
        {
            Ok(response) => response.status() != reqwest::StatusCode::UNAUTHORIZED,
            Err(_) => false,
        }
    }
}

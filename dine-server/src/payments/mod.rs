//! Payment gateway abstraction
//!
//! A provider-neutral trait over interchangeable gateways. Each provider
//! creates a provider-specific order, declares how its checkout opens
//! (popup vs redirect), and verifies a completed payment against the
//! provider's signature scheme. Checkout initiation never mutates order
//! state; only a successful [`PaymentGateway::verify`] feeds the
//! MarkPaid command.
//!
//! Availability is an explicit capability probe per provider, cached with
//! a configurable TTL in [`GatewayRegistry`]. A provider that fails its
//! probe is reported disabled until the next probe window, and recovers
//! without a restart.

mod phonepe;
mod razorpay;

pub use phonepe::{PhonePeConfig, PhonePeGateway};
pub use razorpay::{RazorpayConfig, RazorpayGateway};

use async_trait::async_trait;
use dashmap::DashMap;
use shared::error::{AppError, ErrorCode};
use shared::models::Order;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// How the provider's checkout opens on the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutMode {
    /// In-page widget (client SDK opens with the public key)
    Popup,
    /// Full-page redirect to a provider-hosted URL
    Redirect,
}

/// Provider order created at checkout initiation
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProviderOrderRef {
    pub provider: String,
    /// Provider-side order/transaction reference
    pub reference: String,
    pub checkout_mode: CheckoutMode,
    /// Public key for popup checkouts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    /// Hosted URL for redirect checkouts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

/// What the client hands back after the provider checkout completes
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CheckoutCompletion {
    pub provider_order_ref: String,
    pub provider_payment_id: String,
    /// Provider signature / checksum over the completion
    pub signature: String,
}

/// Outcome of server-side verification
#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    pub provider_order_ref: String,
    pub provider_payment_id: String,
    /// Amount the provider reports as captured
    pub amount: f64,
}

/// Gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Unknown payment provider: {0}")]
    UnknownProvider(String),

    #[error("Provider {0} is currently unavailable")]
    Disabled(String),

    #[error("Payment verification failed: {0}")]
    VerificationFailed(String),

    #[error("Provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider error: {0}")]
    Provider(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::UnknownProvider(p) => {
                AppError::invalid_request(format!("unknown payment provider: {}", p))
            }
            GatewayError::Disabled(p) => AppError::with_message(
                ErrorCode::GatewayDisabled,
                format!("Payment provider {} is currently unavailable", p),
            ),
            GatewayError::VerificationFailed(msg) => {
                AppError::with_message(ErrorCode::VerificationFailed, msg)
            }
            GatewayError::Http(e) => AppError::gateway(e.to_string()),
            GatewayError::Provider(msg) => AppError::gateway(msg),
        }
    }
}

/// A payment provider
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn provider(&self) -> &str;

    /// Declared by the provider, not chosen by the caller
    fn checkout_mode(&self) -> CheckoutMode;

    /// Create the provider-side order for a checkout
    ///
    /// Must not persist anything on our side.
    async fn create_provider_order(&self, order: &Order) -> GatewayResult<ProviderOrderRef>;

    /// Verify a completed checkout against the provider's signature scheme
    async fn verify(
        &self,
        order: &Order,
        completion: &CheckoutCompletion,
    ) -> GatewayResult<VerifiedPayment>;

    /// Capability probe: is this provider currently usable?
    async fn probe(&self) -> bool;
}

struct ProbeEntry {
    available: bool,
    checked_at: Instant,
}

/// Registry of configured gateways with TTL-cached availability probes
pub struct GatewayRegistry {
    gateways: HashMap<String, Arc<dyn PaymentGateway>>,
    probes: DashMap<String, ProbeEntry>,
    probe_ttl: Duration,
}

impl GatewayRegistry {
    pub fn new(probe_ttl: Duration) -> Self {
        Self {
            gateways: HashMap::new(),
            probes: DashMap::new(),
            probe_ttl,
        }
    }

    pub fn register(&mut self, gateway: Arc<dyn PaymentGateway>) {
        self.gateways.insert(gateway.provider().to_string(), gateway);
    }

    pub fn providers(&self) -> Vec<&str> {
        self.gateways.keys().map(|k| k.as_str()).collect()
    }

    /// Look up a provider, re-probing its availability when the cached
    /// result is stale
    pub async fn get(&self, provider: &str) -> GatewayResult<Arc<dyn PaymentGateway>> {
        let gateway = self
            .gateways
            .get(provider)
            .cloned()
            .ok_or_else(|| GatewayError::UnknownProvider(provider.to_string()))?;

        let fresh = self
            .probes
            .get(provider)
            .filter(|e| e.checked_at.elapsed() < self.probe_ttl)
            .map(|e| e.available);

        let available = match fresh {
            Some(available) => available,
            None => {
                let available = gateway.probe().await;
                debug!(provider, available, "gateway probe");
                if !available {
                    warn!(provider, "gateway probe failed, disabling until next window");
                }
                self.probes.insert(
                    provider.to_string(),
                    ProbeEntry {
                        available,
                        checked_at: Instant::now(),
                    },
                );
                available
            }
        };

        if !available {
            return Err(GatewayError::Disabled(provider.to_string()));
        }
        Ok(gateway)
    }
}

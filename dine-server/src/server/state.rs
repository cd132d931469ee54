use std::path::PathBuf;
use std::sync::Arc;

use crate::message::MessageBus;
use crate::orders::OrdersManager;
use crate::payments::{
    GatewayRegistry, PhonePeConfig, PhonePeGateway, RazorpayConfig, RazorpayGateway,
};
use crate::server::ServerConfig;
use crate::tables::SessionBinder;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub orders: OrdersManager,
    pub tables: SessionBinder,
    pub gateways: Arc<GatewayRegistry>,
    pub bus: MessageBus,
}

impl AppState {
    pub fn initialize(config: &ServerConfig) -> anyhow::Result<Self> {
        let data_dir = PathBuf::from(&config.data_dir);
        std::fs::create_dir_all(&data_dir)?;

        let bus = MessageBus::new();
        let orders = OrdersManager::new(
            data_dir.join("dine.redb"),
            bus.clone(),
            config.tax_rate_percent,
        )?;
        let tables = SessionBinder::new(orders.storage().clone(), bus.clone());

        let mut gateways = GatewayRegistry::new(config.gateway_probe_ttl);
        if !config.razorpay_key_id.is_empty() {
            gateways.register(Arc::new(RazorpayGateway::new(RazorpayConfig {
                key_id: config.razorpay_key_id.clone(),
                key_secret: config.razorpay_key_secret.clone(),
                currency: config.currency.clone(),
            })));
        }
        if !config.phonepe_merchant_id.is_empty() {
            gateways.register(Arc::new(PhonePeGateway::new(PhonePeConfig {
                merchant_id: config.phonepe_merchant_id.clone(),
                salt_key: config.phonepe_salt_key.clone(),
                salt_index: config.phonepe_salt_index,
                redirect_url: config.phonepe_redirect_url.clone(),
            })));
        }
        if config.is_production() && gateways.providers().is_empty() {
            tracing::warn!("no payment gateway credentials configured; online checkout is unavailable");
        }

        Ok(Self {
            config: config.clone(),
            orders,
            tables,
            gateways: Arc::new(gateways),
            bus,
        })
    }
}

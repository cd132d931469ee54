use std::time::Duration;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Server configuration, loaded from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
    pub data_dir: String,
    pub environment: String,
    pub shutdown_timeout_ms: u64,

    /// ISO currency code passed to gateways
    pub currency: String,
    /// Tax rate in percent applied at order creation
    pub tax_rate_percent: f64,

    /// How long a gateway availability probe stays cached
    pub gateway_probe_ttl: Duration,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
    pub phonepe_merchant_id: String,
    pub phonepe_salt_key: String,
    pub phonepe_salt_index: u8,
    /// Where the PhonePe hosted page sends the guest back to
    pub phonepe_redirect_url: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            http_port: env_or("HTTP_PORT", 8080),
            data_dir: env_string("DATA_DIR", "/var/lib/dine"),
            environment: env_string("ENVIRONMENT", "development"),
            shutdown_timeout_ms: env_or("SHUTDOWN_TIMEOUT_MS", 10_000),

            currency: env_string("CURRENCY", "INR"),
            tax_rate_percent: env_or("TAX_RATE_PERCENT", 5.0),

            gateway_probe_ttl: Duration::from_secs(env_or("GATEWAY_PROBE_TTL_SECS", 300)),
            razorpay_key_id: env_string("RAZORPAY_KEY_ID", ""),
            razorpay_key_secret: env_string("RAZORPAY_KEY_SECRET", ""),
            phonepe_merchant_id: env_string("PHONEPE_MERCHANT_ID", ""),
            phonepe_salt_key: env_string("PHONEPE_SALT_KEY", ""),
            phonepe_salt_index: env_or("PHONEPE_SALT_INDEX", 1),
            phonepe_redirect_url: env_string("PHONEPE_REDIRECT_URL", ""),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

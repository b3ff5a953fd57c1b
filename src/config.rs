use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub pricing: PricingConfig,
    pub cart_ttl_days: i64,
    pub delivery_sla_minutes: i64,
}

/// Checkout pricing knobs. Amounts are in minor currency units.
#[derive(Debug, Clone, Copy)]
pub struct PricingConfig {
    pub free_delivery_threshold: i64,
    pub delivery_fee: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            free_delivery_threshold: 500,
            delivery_fee: 50,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let defaults = PricingConfig::default();
        let pricing = PricingConfig {
            free_delivery_threshold: env_i64("FREE_DELIVERY_THRESHOLD")
                .unwrap_or(defaults.free_delivery_threshold),
            delivery_fee: env_i64("DELIVERY_FEE").unwrap_or(defaults.delivery_fee),
        };

        Ok(Self {
            database_url,
            host,
            port,
            pricing,
            cart_ttl_days: env_i64("CART_TTL_DAYS").unwrap_or(7),
            delivery_sla_minutes: env_i64("DELIVERY_SLA_MINUTES").unwrap_or(30),
        })
    }
}

fn env_i64(key: &str) -> Option<i64> {
    env::var(key).ok().and_then(|v| v.parse::<i64>().ok())
}

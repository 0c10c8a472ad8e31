use anyhow::Result;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub open_payments: OpenPaymentsConfig,
    pub payment: PaymentConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

/// Identity used to sign Open Payments requests, plus the two wallets the
/// checkout moves money between.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenPaymentsConfig {
    pub wallet_address_url: String,
    /// Path to a PKCS#8 PEM file, or the PEM text itself.
    pub private_key: String,
    pub key_id: String,
    pub sending_wallet_url: String,
    pub receiving_wallet_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// 0 disables expiry of pending grants.
    pub pending_grant_ttl_secs: u64,
    pub ledger_capacity: usize,
    /// 0 disables expiry of ledger entries; capacity still bounds them.
    pub ledger_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "4000".to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "*".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            open_payments: OpenPaymentsConfig {
                wallet_address_url: env::var("OPEN_PAYMENTS_WALLET_ADDRESS")
                    .unwrap_or_else(|_| "https://ilp.interledger-test.dev/5555".to_string()),
                private_key: env::var("OPEN_PAYMENTS_PRIVATE_KEY")
                    .unwrap_or_else(|_| "./private.key".to_string()),
                key_id: env::var("OPEN_PAYMENTS_KEY_ID")
                    .unwrap_or_else(|_| "dcf63a12-4235-4e3c-8b6d-1d122fe7372e".to_string()),
                sending_wallet_url: env::var("SENDING_WALLET_ADDRESS")
                    .unwrap_or_else(|_| "https://ilp.interledger-test.dev/alit".to_string()),
                receiving_wallet_url: env::var("RECEIVING_WALLET_ADDRESS")
                    .unwrap_or_else(|_| "https://ilp.interledger-test.dev/recep".to_string()),
            },
            payment: PaymentConfig {
                pending_grant_ttl_secs: env::var("PENDING_GRANT_TTL_SECS")
                    .unwrap_or_else(|_| "1800".to_string())
                    .parse()?,
                ledger_capacity: env::var("PAYMENT_LEDGER_CAPACITY")
                    .unwrap_or_else(|_| "1024".to_string())
                    .parse()?,
                ledger_ttl_secs: env::var("PAYMENT_LEDGER_TTL_SECS")
                    .unwrap_or_else(|_| "86400".to_string())
                    .parse()?,
            },
        })
    }
}

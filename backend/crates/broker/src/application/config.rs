//! Application Configuration
//!
//! Configuration for the broker application layer, loaded from the process
//! environment by the binary.

use crate::error::{BrokerError, BrokerResult};
use std::time::Duration;

pub const DEFAULT_FACILITATOR_URL: &str = "https://x402.org/facilitator";
pub const DEFAULT_DATA_PORTAL_URL: &str = "http://localhost:8080";
pub const DEFAULT_PORT: u16 = 3000;

/// Broker application configuration
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Receiving wallet; required before any paid purchase
    pub wallet_address: Option<String>,
    /// Payment facilitator base URL
    pub facilitator_url: String,
    /// Content backend ("data portal") base URL
    pub data_portal_url: String,
    /// Public URL of this broker (resource identifiers, discovery documents)
    pub public_base_url: String,
    /// Timeout applied to facilitator and backend calls
    pub http_timeout: Duration,
    /// Accept any non-empty payment proof without settlement
    pub test_mode: bool,
    /// Listen port
    pub port: u16,
    /// Allowed CORS origins; empty means any
    pub cors_origins: Vec<String>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            wallet_address: None,
            facilitator_url: DEFAULT_FACILITATOR_URL.to_string(),
            data_portal_url: DEFAULT_DATA_PORTAL_URL.to_string(),
            public_base_url: format!("http://localhost:{}", DEFAULT_PORT),
            http_timeout: Duration::from_secs(30),
            test_mode: false,
            port: DEFAULT_PORT,
            cors_origins: Vec::new(),
        }
    }
}

impl BrokerConfig {
    /// Load from the process environment
    pub fn from_env() -> BrokerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (used by tests)
    pub fn from_lookup<F>(lookup: F) -> BrokerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| BrokerError::Configuration(format!("PORT '{}': {}", raw, e)))?,
            None => defaults.port,
        };

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse::<u64>().map_err(|e| {
                BrokerError::Configuration(format!("HTTP_TIMEOUT_SECS '{}': {}", raw, e))
            })?),
            None => defaults.http_timeout,
        };

        let test_mode = get("X402_TEST_MODE")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let cors_origins = get("CORS_ORIGINS")
            .filter(|v| v != "*")
            .map(|v| {
                v.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            wallet_address: get("BASE_WALLET_ADDRESS"),
            facilitator_url: get("X402_FACILITATOR_URL").unwrap_or(defaults.facilitator_url),
            data_portal_url: get("DATA_PORTAL_URL").unwrap_or(defaults.data_portal_url),
            public_base_url: get("PUBLIC_BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{}", port)),
            http_timeout,
            test_mode,
            port,
            cors_origins,
        })
    }

    /// The receiving wallet, or a fatal configuration error
    pub fn require_wallet(&self) -> BrokerResult<&str> {
        self.wallet_address
            .as_deref()
            .filter(|w| !w.is_empty())
            .ok_or_else(|| {
                BrokerError::Configuration("BASE_WALLET_ADDRESS is not configured".to_string())
            })
    }

    /// Wallet for display purposes (empty when unset)
    pub fn wallet_or_empty(&self) -> &str {
        self.wallet_address.as_deref().unwrap_or("")
    }
}

//! Outbound HTTP client construction
//!
//! One `reqwest::Client` per upstream, built with an explicit timeout so that
//! a stalled facilitator or backend cannot hold a purchase open indefinitely.

use std::time::Duration;

/// Error when building an HTTP client
#[derive(Debug, thiserror::Error)]
pub enum HttpClientError {
    #[error("Failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Settings for an outbound client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("platform/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Build a client that follows redirects and enforces the configured timeout
pub fn build_http_client(config: &HttpClientConfig) -> Result<reqwest::Client, HttpClientError> {
    let client = reqwest::Client::builder()
        .timeout(config.timeout)
        .user_agent(config.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()?;
    Ok(client)
}

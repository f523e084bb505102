//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `broker::BrokerError` / `kernel::error::AppError`.

use axum::{
    Router, http,
    http::{Method, header},
};
use broker::presentation::SESSION_HEADER;
use broker::{
    BrokerConfig, HttpContentBackend, HttpFacilitator, PurchaseBroker, TestModeFacilitator,
    broker_router, broker_router_generic,
};
use platform::http_client::{HttpClientConfig, build_http_client};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer, ExposeHeaders};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,broker=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BrokerConfig::from_env()?;

    // Missing wallet is fatal per purchase, not at startup: discovery keeps working
    if config.wallet_address.is_none() {
        tracing::warn!("BASE_WALLET_ADDRESS is not set; purchases will fail until it is");
    }

    // Shared outbound client for facilitator and data portal
    let client = build_http_client(&HttpClientConfig {
        timeout: config.http_timeout,
        user_agent: format!("alexandria-x402-broker/{}", env!("CARGO_PKG_VERSION")),
    })?;
    let backend = HttpContentBackend::new(client.clone(), config.data_portal_url.clone());

    tracing::info!(
        facilitator = %config.facilitator_url,
        data_portal = %config.data_portal_url,
        public_base_url = %config.public_base_url,
        test_mode = config.test_mode,
        "Broker configured"
    );

    let cors = cors_layer(&config.cors_origins);
    let port = config.port;

    let broker_routes: Router = if config.test_mode {
        tracing::warn!("X402_TEST_MODE is on: payments are accepted without settlement");
        broker_router_generic(PurchaseBroker::new(TestModeFacilitator, backend, config))
    } else {
        broker_router(PurchaseBroker::new(
            HttpFacilitator::new(client),
            backend,
            config,
        ))
    };

    // Build router
    let app = broker_routes
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Empty origin list means any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        let allowed: Vec<http::HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        AllowOrigin::list(allowed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
            http::HeaderName::from_static(SESSION_HEADER),
            http::HeaderName::from_static("mcp-protocol-version"),
        ]))
        .expose_headers(ExposeHeaders::list([http::HeaderName::from_static(
            SESSION_HEADER,
        )]))
}

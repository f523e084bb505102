//! Read-only discovery endpoints
//!
//! None of these touch a session.

use axum::Json;
use axum::extract::State;
use axum::http::Uri;
use kernel::error::app_error::AppError;
use serde_json::{Value, json};

use crate::domain::payment::resource_for;
use crate::domain::ports::{ContentBackend, PaymentFacilitator};
use crate::domain::value_objects::PaymentMethod;
use crate::presentation::dto::PriceListingItem;
use crate::presentation::handlers::BrokerAppState;
use crate::presentation::protocol::{SERVER_NAME, SUPPORTED_PROTOCOL_VERSIONS, tool_definitions};

const DESCRIPTION: &str = "x402 payment-gated broker for Alexandria Aeternum museum data \
                           and Golden Codex enrichment";

/// GET /
pub async fn root<F, B>(State(state): State<BrokerAppState<F, B>>) -> Json<Value>
where
    F: PaymentFacilitator + Send + Sync + 'static,
    B: ContentBackend + Send + Sync + 'static,
{
    let config = state.broker.config();
    Json(json!({
        "name": SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "description": DESCRIPTION,
        "endpoints": {
            "mcp": "/mcp",
            "health": "/health",
            "schema": "/mcp/schema",
            "manifest": "/.well-known/mcp.json",
            "x402": "/.well-known/x402",
        },
        "tools": tool_names(),
        "payment": {
            "methods": state.broker.payment_methods(),
            "facilitator": config.facilitator_url,
            "testMode": config.test_mode,
        },
        "catalogSize": state.broker.catalog().len(),
    }))
}

/// GET /health
pub async fn health<F, B>(State(state): State<BrokerAppState<F, B>>) -> Json<Value>
where
    F: PaymentFacilitator + Send + Sync + 'static,
    B: ContentBackend + Send + Sync + 'static,
{
    Json(json!({
        "status": "ok",
        "activeSessions": state.sessions.active_count().await,
        "uptimeSeconds": state.started_at.elapsed().as_secs(),
    }))
}

/// GET /mcp/schema
pub async fn schema<F, B>(State(state): State<BrokerAppState<F, B>>) -> Json<Value>
where
    F: PaymentFacilitator + Send + Sync + 'static,
    B: ContentBackend + Send + Sync + 'static,
{
    let catalog: Vec<PriceListingItem> = state
        .broker
        .price_listing(None)
        .into_iter()
        .map(PriceListingItem::from)
        .collect();
    Json(json!({
        "tools": tool_definitions(),
        "catalog": catalog,
        "paymentMethods": state.broker.payment_methods(),
    }))
}

/// GET /.well-known/mcp.json
pub async fn mcp_manifest<F, B>(State(state): State<BrokerAppState<F, B>>) -> Json<Value>
where
    F: PaymentFacilitator + Send + Sync + 'static,
    B: ContentBackend + Send + Sync + 'static,
{
    let base = state.broker.config().public_base_url.trim_end_matches('/');
    Json(json!({
        "name": SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "description": DESCRIPTION,
        "endpoint": format!("{}/mcp", base),
        "transport": "streamable-http",
        "protocolVersions": SUPPORTED_PROTOCOL_VERSIONS,
        "tools": tool_definitions(),
    }))
}

/// GET /.well-known/x402
pub async fn x402_manifest<F, B>(State(state): State<BrokerAppState<F, B>>) -> Json<Value>
where
    F: PaymentFacilitator + Send + Sync + 'static,
    B: ContentBackend + Send + Sync + 'static,
{
    let config = state.broker.config();
    let method = PaymentMethod::UsdcBaseMainnet;
    let items: Vec<Value> = state
        .broker
        .price_listing(None)
        .into_iter()
        .filter(|item| !item.price.is_free())
        .map(|item| {
            json!({
                "id": item.id,
                "name": item.name,
                "price": item.price.amount(),
                "amount": item.price.atomic_units().map(|u| u.to_string()),
                "resource": resource_for(&config.public_base_url, item.id),
            })
        })
        .collect();

    Json(json!({
        "scheme": "exact",
        "network": method.network(),
        "asset": method.asset(),
        "currency": method.currency(),
        "payTo": config.wallet_or_empty(),
        "facilitator": config.facilitator_url,
        "items": items,
    }))
}

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> AppError {
    AppError::not_found(format!("No route for {}", uri.path()))
}

fn tool_names() -> Vec<Value> {
    tool_definitions()
        .as_array()
        .map(|tools| tools.iter().map(|t| t["name"].clone()).collect())
        .unwrap_or_default()
}

//! Broker Router

use axum::{Router, routing::get};

use crate::application::broker::PurchaseBroker;
use crate::domain::ports::{ContentBackend, PaymentFacilitator};
use crate::infra::{HttpContentBackend, HttpFacilitator};
use crate::presentation::discovery;
use crate::presentation::handlers::{self, BrokerAppState};

/// Create the broker router over the HTTP facilitator and data portal
pub fn broker_router(broker: PurchaseBroker<HttpFacilitator, HttpContentBackend>) -> Router {
    broker_router_generic(broker)
}

/// Create a broker router for any facilitator and backend implementation
pub fn broker_router_generic<F, B>(broker: PurchaseBroker<F, B>) -> Router
where
    F: PaymentFacilitator + Send + Sync + 'static,
    B: ContentBackend + Send + Sync + 'static,
{
    let state = BrokerAppState::new(broker);

    Router::new()
        .route(
            "/mcp",
            get(handlers::get_mcp::<F, B>)
                .post(handlers::post_mcp::<F, B>)
                .delete(handlers::delete_mcp::<F, B>),
        )
        .route("/", get(discovery::root::<F, B>))
        .route("/health", get(discovery::health::<F, B>))
        .route("/mcp/schema", get(discovery::schema::<F, B>))
        .route("/.well-known/mcp.json", get(discovery::mcp_manifest::<F, B>))
        .route("/.well-known/x402", get(discovery::x402_manifest::<F, B>))
        .fallback(discovery::not_found)
        .with_state(state)
}

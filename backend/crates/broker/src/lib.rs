//! Broker (x402 Purchase Broker) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Catalog, delivery table, entities, port traits
//! - `application/` - Purchase orchestration, payment verification, sessions
//! - `infra/` - Facilitator and content backend HTTP clients
//! - `presentation/` - JSON-RPC protocol server, HTTP handlers, router
//!
//! ## Purchase Model
//! - Free items are delivered without contacting the facilitator
//! - Priced items are verified and settled once, never retried
//! - Purchase failures come back as orders whose result text says why
//! - Payment proofs are forwarded to the backend whenever supplied

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::broker::PurchaseBroker;
pub use application::config::BrokerConfig;
pub use error::{BrokerError, BrokerResult};
pub use infra::{HttpContentBackend, HttpFacilitator, TestModeFacilitator};
pub use presentation::router::{broker_router, broker_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entities::*;
    pub use crate::domain::value_objects::*;
    pub use crate::presentation::dto::*;
}

#[cfg(test)]
mod tests;

//! Port Traits
//!
//! Interfaces to the collaborators the broker talks to. Implementations live
//! in the infrastructure layer.

use crate::domain::delivery::DeliveryRequest;
use crate::domain::payment::{SettlementOutcome, SettlementRequest};
use crate::error::BrokerResult;

/// External payment facilitator
#[trait_variant::make(PaymentFacilitator: Send)]
pub trait LocalPaymentFacilitator {
    /// Verify the proof against the requirements and settle it on-chain
    ///
    /// A declined payment is `Ok` with `success == false`; `Err` means the
    /// facilitator could not be consulted at all.
    async fn verify_and_settle(&self, request: &SettlementRequest)
    -> BrokerResult<SettlementOutcome>;
}

/// Content provider that fulfils purchases
#[trait_variant::make(ContentBackend: Send)]
pub trait LocalContentBackend {
    /// Send the request and return the raw response body, whatever the status
    async fn fetch(&self, request: &DeliveryRequest, payment_proof: Option<&str>)
    -> BrokerResult<String>;
}


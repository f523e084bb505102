//! Payment Verifier
//!
//! Builds one deterministic settlement request and interprets the
//! facilitator's verdict. Never retries.

use crate::domain::payment::{SettlementOutcome, SettlementRequest};
use crate::domain::ports::PaymentFacilitator;
use crate::domain::value_objects::{PaymentMethod, Price};
use std::sync::Arc;

/// Verdict handed back to the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub success: bool,
    pub message: Option<String>,
}

impl From<SettlementOutcome> for VerificationResult {
    fn from(outcome: SettlementOutcome) -> Self {
        Self {
            success: outcome.success,
            message: outcome.message,
        }
    }
}

impl VerificationResult {
    fn declined(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

pub struct PaymentVerifier<F>
where
    F: PaymentFacilitator,
{
    facilitator: Arc<F>,
}

impl<F> PaymentVerifier<F>
where
    F: PaymentFacilitator + Send + Sync,
{
    pub fn new(facilitator: Arc<F>) -> Self {
        Self { facilitator }
    }

    /// Verify and settle `proof` for `amount` paid to `payee_wallet`
    ///
    /// Only called for priced items. Facilitator transport errors become a
    /// declined result carrying the error text.
    #[allow(clippy::too_many_arguments)]
    pub async fn verify_and_settle(
        &self,
        amount: Price,
        payee_wallet: &str,
        proof: &str,
        facilitator_endpoint: &str,
        resource: &str,
        payment_method: PaymentMethod,
        description: &str,
    ) -> VerificationResult {
        if amount.payment_method() != payment_method {
            return VerificationResult::declined(format!(
                "payment method {} does not match price currency {}",
                payment_method,
                amount.payment_method()
            ));
        }

        if proof.trim().is_empty() {
            return VerificationResult::declined("missing payment proof");
        }

        let request = SettlementRequest {
            amount,
            pay_to: payee_wallet.to_string(),
            proof: proof.to_string(),
            facilitator_url: facilitator_endpoint.to_string(),
            resource: resource.to_string(),
            description: description.to_string(),
        };

        tracing::debug!(
            resource = %resource,
            amount = %amount,
            proof = %platform::crypto::fingerprint(proof),
            "Submitting payment to facilitator"
        );

        match self.facilitator.verify_and_settle(&request).await {
            Ok(outcome) => {
                if outcome.success {
                    tracing::info!(
                        resource = %resource,
                        amount = %amount,
                        transaction = outcome.transaction.as_deref().unwrap_or(""),
                        "Payment settled"
                    );
                }
                outcome.into()
            }
            Err(e) => {
                tracing::warn!(error = %e, resource = %resource, "Facilitator call failed");
                VerificationResult::declined(e.to_string())
            }
        }
    }
}

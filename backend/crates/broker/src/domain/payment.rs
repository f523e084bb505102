//! Payment settlement values
//!
//! What the broker hands a facilitator, and what comes back.

use crate::domain::value_objects::{PaymentMethod, Price};
use serde_json::{Value, json};

/// Seconds the payer's authorization must remain valid for settlement
pub const MAX_TIMEOUT_SECONDS: u64 = 300;

/// One verify-and-settle attempt
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementRequest {
    pub amount: Price,
    pub pay_to: String,
    pub proof: String,
    pub facilitator_url: String,
    /// Stable per item, so the facilitator can bind a proof to one resource
    pub resource: String,
    pub description: String,
}

impl SettlementRequest {
    pub fn payment_method(&self) -> PaymentMethod {
        self.amount.payment_method()
    }

    /// x402 `exact` scheme requirements matching what the payer was quoted
    pub fn payment_requirements(&self) -> Value {
        let method = self.payment_method();
        let (domain_name, domain_version) = method.eip712_domain();
        let amount = self
            .amount
            .atomic_units()
            .map(|units| units.to_string())
            .unwrap_or_default();
        json!({
            "scheme": "exact",
            "network": method.network(),
            "asset": method.asset(),
            "amount": amount,
            "maxAmountRequired": amount,
            "payTo": self.pay_to,
            "resource": self.resource,
            "description": self.description,
            "mimeType": "application/json",
            "maxTimeoutSeconds": MAX_TIMEOUT_SECONDS,
            "extra": { "name": domain_name, "version": domain_version },
        })
    }
}

/// Facilitator verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementOutcome {
    pub success: bool,
    pub message: Option<String>,
    pub transaction: Option<String>,
}

impl SettlementOutcome {
    pub fn settled(transaction: Option<String>) -> Self {
        Self {
            success: true,
            message: None,
            transaction,
        }
    }

    pub fn declined(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            transaction: None,
        }
    }
}

/// Resource identifier for an item, rooted at the broker's public URL
pub fn resource_for(public_base_url: &str, item_id: &str) -> String {
    format!("{}/items/{}", public_base_url.trim_end_matches('/'), item_id)
}

//! Domain Entities
//!
//! Core records for the purchase domain. Nothing here is persisted: catalog
//! items live for the process, orders live for one request.

use crate::domain::value_objects::{PaymentMethod, Price};
use kernel::id::OrderId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Catalog entry: something a caller can buy (or get for free)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchasableItem {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub price: Price,
    /// Parameter name -> human-readable hint, in declaration order
    pub params: &'static [(&'static str, &'static str)],
}

impl PurchasableItem {
    /// Case-insensitive substring match on name or description
    pub fn matches(&self, query_lower: &str) -> bool {
        self.name.to_lowercase().contains(query_lower)
            || self.description.to_lowercase().contains(query_lower)
    }
}

/// Where payments for one rail must be sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodDescriptor {
    pub wallet: String,
    pub payment_method: PaymentMethod,
}

/// Caller's purchase input, echoed back verbatim on the order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub item_id: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    /// Opaque payment proof; empty for free items
    #[serde(default)]
    pub signed_transaction: String,
    pub payment_method: String,
}

impl PurchaseRequest {
    /// Proof exactly as supplied, or `None` when it is blank
    pub fn payment_proof(&self) -> Option<&str> {
        let proof = self.signed_transaction.as_str();
        (!proof.trim().is_empty()).then_some(proof)
    }
}

/// Terminal state a purchase ended in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStage {
    Delivered,
    DeliveryFailed,
    PaymentFailed,
    Rejected,
}

/// Ephemeral outcome of one `make-purchase` call
///
/// `tool_result` carries either delivered content or a failure message; the
/// two share a shape on purpose and callers must treat it opaquely.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub purchasable_item_id: String,
    pub original_request: PurchaseRequest,
    pub order_id: OrderId,
    pub tool_result: String,
    #[serde(skip)]
    pub stage: PurchaseStage,
}

impl Order {
    pub fn new(request: PurchaseRequest, stage: PurchaseStage, tool_result: String) -> Self {
        Self {
            purchasable_item_id: request.item_id.clone(),
            original_request: request,
            order_id: OrderId::new(),
            tool_result,
            stage,
        }
    }
}

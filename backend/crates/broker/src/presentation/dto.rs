//! Tool DTOs (Data Transfer Objects)

use crate::domain::entities::PurchasableItem;
use rust_decimal::Decimal;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Protocol
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

/// `tools/call` result
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub content: Vec<TextContent>,
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn text(text: String) -> Self {
        Self {
            content: vec![TextContent { kind: "text", text }],
            is_error: false,
        }
    }
}

// ============================================================================
// Price Listing
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceListingArgs {
    pub search_query: Option<String>,
}

/// Parameter hints, serialized as an object in declaration order
#[derive(Debug, Clone, Copy)]
pub struct ParamHints(pub &'static [(&'static str, &'static str)]);

impl Serialize for ParamHints {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().copied())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceListingItem {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub price: Decimal,
    pub currency: &'static str,
    pub payment_method: &'static str,
    pub params: ParamHints,
}

impl From<&PurchasableItem> for PriceListingItem {
    fn from(item: &PurchasableItem) -> Self {
        let method = item.price.payment_method();
        Self {
            id: item.id,
            name: item.name,
            description: item.description,
            price: item.price.amount(),
            currency: method.currency(),
            payment_method: method.as_str(),
            params: ParamHints(item.params),
        }
    }
}

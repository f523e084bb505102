//! Per-Session Protocol Server
//!
//! One `McpServer` per session. It answers the JSON-RPC lifecycle methods
//! and routes `tools/call` to the shared [`PurchaseBroker`].

use crate::application::broker::PurchaseBroker;
use crate::domain::entities::PurchaseRequest;
use crate::domain::ports::{ContentBackend, PaymentFacilitator};
use crate::error::BrokerError;
use crate::presentation::dto::{
    InitializeParams, PriceListingArgs, PriceListingItem, ToolCallParams, ToolCallResult,
};
use crate::presentation::jsonrpc::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION, JsonRpcRequest,
    JsonRpcResponse, METHOD_NOT_FOUND,
};
use kernel::id::SessionId;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::OnceLock;

/// Newest first
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];

pub const SERVER_NAME: &str = "alexandria-x402-broker";

pub const TOOL_PRICE_LISTING: &str = "price-listing";
pub const TOOL_PAYMENT_METHODS: &str = "payment-methods";
pub const TOOL_MAKE_PURCHASE: &str = "make-purchase";

/// Client's version when supported, otherwise the newest we speak
pub fn negotiate_protocol_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|r| SUPPORTED_PROTOCOL_VERSIONS.iter().copied().find(|v| *v == r))
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0])
}

/// Tool descriptors as returned by `tools/list`
pub fn tool_definitions() -> Value {
    json!([
        {
            "name": TOOL_PRICE_LISTING,
            "description": "List purchasable Alexandria Aeternum products with prices and \
                            parameters. Optionally filter by a case-insensitive search query.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "searchQuery": {
                        "type": "string",
                        "description": "Substring matched against product name and description"
                    }
                }
            }
        },
        {
            "name": TOOL_PAYMENT_METHODS,
            "description": "List accepted payment methods and the wallet each one pays.",
            "inputSchema": { "type": "object", "properties": {} }
        },
        {
            "name": TOOL_MAKE_PURCHASE,
            "description": "Purchase a product. Free products need no payment; priced products \
                            need an x402 payment proof in signedTransaction.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "itemId": { "type": "string", "description": "Product id from price-listing" },
                    "params": {
                        "type": "object",
                        "additionalProperties": { "type": "string" },
                        "description": "Product parameters as listed by price-listing"
                    },
                    "signedTransaction": {
                        "type": "string",
                        "description": "Base64 x402 payment payload; empty for free products"
                    },
                    "paymentMethod": { "type": "string", "enum": ["USDC_BASE_MAINNET"] }
                },
                "required": ["itemId", "paymentMethod"]
            }
        }
    ])
}

pub struct McpServer<F, B>
where
    F: PaymentFacilitator,
    B: ContentBackend,
{
    session_id: SessionId,
    broker: PurchaseBroker<F, B>,
    /// Fixed by the first `initialize`
    protocol_version: OnceLock<&'static str>,
}

impl<F, B> McpServer<F, B>
where
    F: PaymentFacilitator + Send + Sync,
    B: ContentBackend + Send + Sync,
{
    pub fn new(session_id: SessionId, broker: PurchaseBroker<F, B>) -> Self {
        Self {
            session_id,
            broker,
            protocol_version: OnceLock::new(),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Handle one message; `None` for notifications
    pub async fn handle(&self, message: Value) -> Option<JsonRpcResponse> {
        let id = message.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    id,
                    INVALID_REQUEST,
                    format!("Invalid Request: {}", e),
                ));
            }
        };
        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                id,
                INVALID_REQUEST,
                "Invalid Request: jsonrpc must be \"2.0\"",
            ));
        }

        tracing::debug!(
            session_id = %self.session_id,
            method = %request.method,
            "Protocol message"
        );

        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }

        let outcome = match request.method.as_str() {
            "initialize" => self.initialize(request.params),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tool_definitions() })),
            "tools/call" => self.call_tool(request.params).await,
            other => Err((METHOD_NOT_FOUND, format!("Method not found: {}", other))),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err((code, message)) => JsonRpcResponse::failure(id, code, message),
        })
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        if request.method == "notifications/initialized" {
            tracing::debug!(session_id = %self.session_id, "Client initialized");
        }
    }

    fn initialize(&self, params: Option<Value>) -> Result<Value, (i64, String)> {
        let params: InitializeParams = parse_params(params)?;
        let version = negotiate_protocol_version(params.protocol_version.as_deref());
        let version = *self.protocol_version.get_or_init(|| version);

        Ok(json!({
            "protocolVersion": version,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            },
            "instructions": "Call price-listing to browse, payment-methods for the receiving \
                             wallet, then make-purchase. Priced items need an x402 payment proof.",
        }))
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, (i64, String)> {
        let call: ToolCallParams = parse_params(params)?;

        let text = match call.name.as_str() {
            TOOL_PRICE_LISTING => {
                let args: PriceListingArgs = parse_params(call.arguments)?;
                let items: Vec<PriceListingItem> = self
                    .broker
                    .price_listing(args.search_query.as_deref())
                    .into_iter()
                    .map(PriceListingItem::from)
                    .collect();
                to_text(&items)?
            }
            TOOL_PAYMENT_METHODS => to_text(self.broker.payment_methods())?,
            TOOL_MAKE_PURCHASE => {
                let request: PurchaseRequest = parse_params(call.arguments)?;
                let order = self
                    .broker
                    .make_purchase(request)
                    .await
                    .map_err(internal_error)?;
                to_text(&order)?
            }
            other => return Err((INVALID_PARAMS, format!("Unknown tool: {}", other))),
        };

        let result = ToolCallResult::text(text);
        serde_json::to_value(result).map_err(|e| (INTERNAL_ERROR, e.to_string()))
    }
}

/// Absent params deserialize from an empty object
fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, (i64, String)> {
    let params = match params {
        None | Some(Value::Null) => json!({}),
        Some(value) => value,
    };
    serde_json::from_value(params).map_err(|e| (INVALID_PARAMS, format!("Invalid params: {}", e)))
}

fn to_text<T: Serialize + ?Sized>(value: &T) -> Result<String, (i64, String)> {
    serde_json::to_string_pretty(value).map_err(|e| (INTERNAL_ERROR, e.to_string()))
}

fn internal_error(err: BrokerError) -> (i64, String) {
    (INTERNAL_ERROR, err.to_string())
}

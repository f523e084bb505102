//! Unit tests for the broker crate
//! Orchestrator properties, HTTP surface and error mapping

#[cfg(test)]
mod support {
    use crate::application::broker::PurchaseBroker;
    use crate::application::config::BrokerConfig;
    use crate::domain::delivery::DeliveryRequest;
    use crate::domain::entities::PurchaseRequest;
    use crate::domain::payment::{SettlementOutcome, SettlementRequest};
    use crate::domain::ports::{ContentBackend, PaymentFacilitator};
    use crate::error::{BrokerError, BrokerResult};
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    pub const WALLET: &str = "0x1111111111111111111111111111111111111111";

    /// Facilitator that records every request and answers with a fixed verdict
    pub struct MockFacilitator {
        pub verdict: Result<SettlementOutcome, String>,
        pub calls: Arc<Mutex<Vec<SettlementRequest>>>,
    }

    impl PaymentFacilitator for MockFacilitator {
        async fn verify_and_settle(
            &self,
            request: &SettlementRequest,
        ) -> BrokerResult<SettlementOutcome> {
            self.calls.lock().unwrap().push(request.clone());
            self.verdict.clone().map_err(BrokerError::Facilitator)
        }
    }

    /// Backend that records every request and answers with a fixed body
    pub struct MockBackend {
        pub response: Result<String, String>,
        pub calls: Arc<Mutex<Vec<(DeliveryRequest, Option<String>)>>>,
    }

    impl ContentBackend for MockBackend {
        async fn fetch(
            &self,
            request: &DeliveryRequest,
            payment_proof: Option<&str>,
        ) -> BrokerResult<String> {
            self.calls
                .lock()
                .unwrap()
                .push((request.clone(), payment_proof.map(String::from)));
            self.response.clone().map_err(BrokerError::Backend)
        }
    }

    /// Backend that parks every fetch until the test releases it
    pub struct GatedBackend {
        pub entered: Arc<Notify>,
        pub gate: Arc<Notify>,
    }

    impl ContentBackend for GatedBackend {
        async fn fetch(
            &self,
            _request: &DeliveryRequest,
            _payment_proof: Option<&str>,
        ) -> BrokerResult<String> {
            self.entered.notify_one();
            self.gate.notified().await;
            Ok("gated-body".to_string())
        }
    }

    pub struct Harness {
        pub broker: PurchaseBroker<MockFacilitator, MockBackend>,
        pub facilitator_calls: Arc<Mutex<Vec<SettlementRequest>>>,
        pub backend_calls: Arc<Mutex<Vec<(DeliveryRequest, Option<String>)>>>,
    }

    impl Harness {
        pub fn facilitator_call_count(&self) -> usize {
            self.facilitator_calls.lock().unwrap().len()
        }

        pub fn backend_call_count(&self) -> usize {
            self.backend_calls.lock().unwrap().len()
        }
    }

    pub fn config() -> BrokerConfig {
        BrokerConfig {
            wallet_address: Some(WALLET.to_string()),
            ..BrokerConfig::default()
        }
    }

    pub fn harness_with(
        config: BrokerConfig,
        verdict: Result<SettlementOutcome, String>,
        response: Result<String, String>,
    ) -> Harness {
        let facilitator_calls = Arc::new(Mutex::new(Vec::new()));
        let backend_calls = Arc::new(Mutex::new(Vec::new()));
        let broker = PurchaseBroker::new(
            MockFacilitator {
                verdict,
                calls: facilitator_calls.clone(),
            },
            MockBackend {
                response,
                calls: backend_calls.clone(),
            },
            config,
        );
        Harness {
            broker,
            facilitator_calls,
            backend_calls,
        }
    }

    pub fn harness(verdict: Result<SettlementOutcome, String>) -> Harness {
        harness_with(config(), verdict, Ok(r#"{"results":[]}"#.to_string()))
    }

    pub fn purchase(item_id: &str, params: &[(&str, &str)], proof: &str) -> PurchaseRequest {
        PurchaseRequest {
            item_id: item_id.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            signed_transaction: proof.to_string(),
            payment_method: "USDC_BASE_MAINNET".to_string(),
        }
    }
}

#[cfg(test)]
mod orchestrator_tests {
    use super::support::*;
    use crate::domain::entities::PurchaseStage;
    use crate::domain::payment::SettlementOutcome;
    use crate::error::BrokerError;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_free_item_never_verifies_even_with_proof() {
        let h = harness(Ok(SettlementOutcome::declined("should not be asked")));

        let order = h
            .broker
            .make_purchase(purchase("search-alexandria", &[("query", "monet")], "some-proof"))
            .await
            .unwrap();

        assert_eq!(order.stage, PurchaseStage::Delivered);
        assert_eq!(order.tool_result, r#"{"results":[]}"#);
        assert_eq!(h.facilitator_call_count(), 0);

        let calls = h.backend_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.path_and_query(), "/agent/search?q=monet&limit=20");
        // Forwarded even though the item is free
        assert_eq!(calls[0].1.as_deref(), Some("some-proof"));
    }

    #[tokio::test]
    async fn test_free_item_without_proof_sends_no_proof() {
        let h = harness(Ok(SettlementOutcome::settled(None)));

        h.broker
            .make_purchase(purchase("curated-metadata", &[("artifactId", "met_10049")], ""))
            .await
            .unwrap();

        let calls = h.backend_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.path_and_query(), "/agent/artifact/met_10049");
        assert_eq!(calls[0].1, None);
    }

    #[tokio::test]
    async fn test_rejected_payment_performs_no_delivery() {
        let h = harness(Ok(SettlementOutcome::declined("insufficient funds")));

        let order = h
            .broker
            .make_purchase(purchase("oracle-metadata", &[("artifactId", "met_1")], "proof"))
            .await
            .unwrap();

        assert_eq!(order.stage, PurchaseStage::PaymentFailed);
        assert_eq!(order.tool_result, "Payment failed: insufficient funds");
        assert_eq!(h.facilitator_call_count(), 1);
        assert_eq!(h.backend_call_count(), 0);
    }

    #[tokio::test]
    async fn test_accepted_payment_delivers_once_with_proof_unchanged() {
        let h = harness(Ok(SettlementOutcome::settled(Some("0xtx".to_string()))));

        let order = h
            .broker
            .make_purchase(purchase("oracle-metadata", &[("artifactId", "met_1")], " proof-xyz\n"))
            .await
            .unwrap();

        assert_eq!(order.stage, PurchaseStage::Delivered);

        let settlements = h.facilitator_calls.lock().unwrap();
        assert_eq!(settlements.len(), 1);
        assert_eq!(settlements[0].amount.amount(), dec!(0.20));
        assert_eq!(settlements[0].pay_to, WALLET);
        assert_eq!(settlements[0].proof, " proof-xyz\n");
        assert_eq!(
            settlements[0].resource,
            "http://localhost:3000/items/oracle-metadata"
        );

        let deliveries = h.backend_calls.lock().unwrap();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].0.path_and_query(), "/agent/artifact/met_1/oracle");
        assert_eq!(deliveries[0].1.as_deref(), Some(" proof-xyz\n"));
    }

    #[tokio::test]
    async fn test_resource_is_stable_across_calls() {
        let h = harness(Ok(SettlementOutcome::settled(None)));
        for _ in 0..2 {
            h.broker
                .make_purchase(purchase("oracle-metadata", &[("artifactId", "met_1")], "p"))
                .await
                .unwrap();
        }
        let settlements = h.facilitator_calls.lock().unwrap();
        assert_eq!(settlements[0].resource, settlements[1].resource);
        assert_eq!(settlements[0].payment_requirements(), settlements[1].payment_requirements());
    }

    #[tokio::test]
    async fn test_priced_item_with_empty_proof_fails_without_facilitator() {
        let h = harness(Ok(SettlementOutcome::settled(None)));

        let order = h
            .broker
            .make_purchase(purchase("batch-download", &[], "   "))
            .await
            .unwrap();

        assert_eq!(order.tool_result, "Payment failed: missing payment proof");
        assert_eq!(h.facilitator_call_count(), 0);
        assert_eq!(h.backend_call_count(), 0);
    }

    #[tokio::test]
    async fn test_facilitator_transport_error_is_payment_failure() {
        let h = harness(Err("x402 facilitator timeout".to_string()));

        let order = h
            .broker
            .make_purchase(purchase("enrich-oracle-only", &[("imageUrl", "https://x/a.png")], "p"))
            .await
            .unwrap();

        assert_eq!(order.stage, PurchaseStage::PaymentFailed);
        assert_eq!(
            order.tool_result,
            "Payment failed: Facilitator error: x402 facilitator timeout"
        );
        assert_eq!(h.backend_call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_item_is_rejected_with_fresh_order_ids() {
        let h = harness(Ok(SettlementOutcome::settled(None)));

        let first = h
            .broker
            .make_purchase(purchase("no-such-item", &[], "proof"))
            .await
            .unwrap();
        let second = h
            .broker
            .make_purchase(purchase("no-such-item", &[], "proof"))
            .await
            .unwrap();

        assert_eq!(first.stage, PurchaseStage::Rejected);
        assert!(first.tool_result.contains("not found"));
        assert!(!first.order_id.to_string().is_empty());
        assert_ne!(first.order_id, second.order_id);
        assert_eq!(first.purchasable_item_id, "no-such-item");
        assert_eq!(h.facilitator_call_count(), 0);
        assert_eq!(h.backend_call_count(), 0);
    }

    #[tokio::test]
    async fn test_payment_method_mismatch_is_not_found() {
        let h = harness(Ok(SettlementOutcome::settled(None)));
        let mut request = purchase("oracle-metadata", &[("artifactId", "met_1")], "proof");
        request.payment_method = "ETH_MAINNET".to_string();

        let order = h.broker.make_purchase(request).await.unwrap();

        assert_eq!(order.stage, PurchaseStage::Rejected);
        assert!(order.tool_result.contains("not found"));
        assert_eq!(h.facilitator_call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_wallet_is_configuration_error() {
        let mut config = config();
        config.wallet_address = None;
        let h = harness_with(config, Ok(SettlementOutcome::settled(None)), Ok(String::new()));

        let err = h
            .broker
            .make_purchase(purchase("search-alexandria", &[("query", "x")], ""))
            .await
            .unwrap_err();

        assert!(matches!(err, BrokerError::Configuration(_)));
        assert_eq!(h.backend_call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_parameter_is_delivery_failure() {
        let h = harness(Ok(SettlementOutcome::settled(None)));

        let order = h
            .broker
            .make_purchase(purchase("search-alexandria", &[], ""))
            .await
            .unwrap();

        assert_eq!(order.stage, PurchaseStage::DeliveryFailed);
        assert_eq!(
            order.tool_result,
            "Delivery failed: missing required parameter 'query'"
        );
        assert_eq!(h.backend_call_count(), 0);
    }

    #[tokio::test]
    async fn test_backend_transport_error_is_delivery_failure() {
        let h = harness_with(
            config(),
            Ok(SettlementOutcome::settled(None)),
            Err("connection refused".to_string()),
        );

        let order = h
            .broker
            .make_purchase(purchase("compliance-manifest", &[("datasetId", "met-museum")], ""))
            .await
            .unwrap();

        assert_eq!(order.stage, PurchaseStage::DeliveryFailed);
        assert_eq!(
            order.tool_result,
            "Delivery failed: Backend error: connection refused"
        );
    }

    #[tokio::test]
    async fn test_backend_error_body_is_relayed_verbatim() {
        let h = harness_with(
            config(),
            Ok(SettlementOutcome::settled(None)),
            Ok(r#"{"detail":"Artifact not found"}"#.to_string()),
        );

        let order = h
            .broker
            .make_purchase(purchase("curated-metadata", &[("artifactId", "nope")], ""))
            .await
            .unwrap();

        assert_eq!(order.stage, PurchaseStage::Delivered);
        assert_eq!(order.tool_result, r#"{"detail":"Artifact not found"}"#);
    }

    #[test]
    fn test_price_listing_filters_case_insensitively() {
        let h = harness(Ok(SettlementOutcome::settled(None)));

        let all = h.broker.price_listing(None);
        assert_eq!(all.len(), 8);
        assert_eq!(all[0].id, "search-alexandria");
        assert_eq!(all[7].id, "enrich-full-certified");

        for query in ["ORACLE", "golden codex", "metadata"] {
            let hits = h.broker.price_listing(Some(query));
            assert!(!hits.is_empty());
            let q = query.to_lowercase();
            for item in hits {
                assert!(
                    item.name.to_lowercase().contains(&q)
                        || item.description.to_lowercase().contains(&q)
                );
            }
        }

        assert!(h.broker.price_listing(Some("zzz-nothing")).is_empty());
    }

    #[test]
    fn test_payment_methods_carry_wallet() {
        let h = harness(Ok(SettlementOutcome::settled(None)));
        let methods = h.broker.payment_methods();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].wallet, WALLET);
    }
}

#[cfg(test)]
mod router_tests {
    use super::support::*;
    use crate::domain::payment::SettlementOutcome;
    use crate::presentation::router::broker_router_generic;
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{HeaderMap, Method, Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn app() -> Router {
        broker_router_generic(harness(Ok(SettlementOutcome::declined("insufficient funds"))).broker)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        session: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(session) = session {
            builder = builder.header("mcp-session-id", session);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, value)
    }

    fn initialize_message() -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": 0,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": { "name": "test-client", "version": "1.0" }
            }
        })
    }

    async fn open_session(app: &Router) -> String {
        let (status, headers, body) =
            send(app, Method::POST, "/mcp", None, Some(initialize_message())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["protocolVersion"], "2025-03-26");
        headers
            .get("mcp-session-id")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    async fn call_tool(app: &Router, session: &str, name: &str, arguments: Value) -> Value {
        let (status, _, body) = send(
            app,
            Method::POST,
            "/mcp",
            Some(session),
            Some(json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "tools/call",
                "params": { "name": name, "arguments": arguments }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    async fn active_sessions(app: &Router) -> u64 {
        let (_, _, body) = send(app, Method::GET, "/health", None, None).await;
        body["activeSessions"].as_u64().unwrap()
    }

    #[tokio::test]
    async fn test_initialize_returns_session_header() {
        let app = app();
        let session = open_session(&app).await;
        assert!(!session.is_empty());
        assert_eq!(active_sessions(&app).await, 1);
    }

    #[tokio::test]
    async fn test_missing_session_is_rejected_without_allocation() {
        let app = app();
        let (status, _, body) = send(
            &app,
            Method::POST,
            "/mcp",
            None,
            Some(json!({"jsonrpc":"2.0","id":1,"method":"tools/list"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], -32000);
        assert_eq!(
            body["error"]["message"],
            "Bad Request: No valid session ID provided"
        );
        assert_eq!(body["id"], Value::Null);
        assert_eq!(active_sessions(&app).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_session_is_rejected() {
        let app = app();
        let unknown = kernel::id::SessionId::new().to_string();
        let (status, _, body) = send(
            &app,
            Method::POST,
            "/mcp",
            Some(unknown.as_str()),
            Some(json!({"jsonrpc":"2.0","id":1,"method":"ping"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], -32000);
        assert_eq!(active_sessions(&app).await, 0);
    }

    #[tokio::test]
    async fn test_sessions_get_distinct_ids() {
        let app = app();
        let a = open_session(&app).await;
        let b = open_session(&app).await;
        assert_ne!(a, b);
        assert_eq!(active_sessions(&app).await, 2);

        let (_, headers, _) = send(
            &app,
            Method::POST,
            "/mcp",
            Some(a.as_str()),
            Some(json!({"jsonrpc":"2.0","id":2,"method":"ping"})),
        )
        .await;
        assert_eq!(headers.get("mcp-session-id").unwrap().to_str().unwrap(), a);
    }

    #[tokio::test]
    async fn test_notification_is_accepted() {
        let app = app();
        let session = open_session(&app).await;
        let (status, _, body) = send(
            &app,
            Method::POST,
            "/mcp",
            Some(session.as_str()),
            Some(json!({"jsonrpc":"2.0","method":"notifications/initialized"})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn test_null_id_is_answered_not_accepted() {
        let app = app();
        let session = open_session(&app).await;
        let (status, _, body) = send(
            &app,
            Method::POST,
            "/mcp",
            Some(session.as_str()),
            Some(json!({"jsonrpc":"2.0","id":null,"method":"ping"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"jsonrpc":"2.0","id":null,"result":{}}));
    }

    #[tokio::test]
    async fn test_slow_purchase_does_not_block_other_sessions() {
        let entered = Arc::new(Notify::new());
        let gate = Arc::new(Notify::new());
        let broker = crate::application::broker::PurchaseBroker::new(
            MockFacilitator {
                verdict: Ok(SettlementOutcome::settled(Some("0xabc".to_string()))),
                calls: Default::default(),
            },
            GatedBackend {
                entered: entered.clone(),
                gate: gate.clone(),
            },
            config(),
        );
        let app = broker_router_generic(broker);
        let a = open_session(&app).await;

        let pending = {
            let app = app.clone();
            let a = a.clone();
            tokio::spawn(async move {
                send(
                    &app,
                    Method::POST,
                    "/mcp",
                    Some(a.as_str()),
                    Some(json!({
                        "jsonrpc": "2.0",
                        "id": 11,
                        "method": "tools/call",
                        "params": {
                            "name": "make-purchase",
                            "arguments": {
                                "itemId": "search-alexandria",
                                "params": { "query": "monet" },
                                "signedTransaction": "proof-a",
                                "paymentMethod": "USDC_BASE_MAINNET"
                            }
                        }
                    })),
                )
                .await
            })
        };
        entered.notified().await;

        // A is parked inside the backend; B must still be served
        let b = tokio::time::timeout(Duration::from_secs(5), open_session(&app))
            .await
            .unwrap();
        let (status, headers, body) = tokio::time::timeout(
            Duration::from_secs(5),
            send(
                &app,
                Method::POST,
                "/mcp",
                Some(b.as_str()),
                Some(json!({"jsonrpc":"2.0","id":12,"method":"ping"})),
            ),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 12);
        assert_eq!(headers.get("mcp-session-id").unwrap().to_str().unwrap(), b);

        let listing = tokio::time::timeout(
            Duration::from_secs(5),
            call_tool(&app, &b, "price-listing", json!({})),
        )
        .await
        .unwrap();
        assert!(listing["result"]["content"][0]["text"].is_string());
        assert!(!pending.is_finished());

        gate.notify_one();
        let (status, headers, body) = pending.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers.get("mcp-session-id").unwrap().to_str().unwrap(), a);
        assert_ne!(a, b);
        assert_eq!(body["id"], 11);
        let order: Value =
            serde_json::from_str(body["result"]["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(order["toolResult"], "gated-body");
    }

    #[tokio::test]
    async fn test_tools_list_and_unknown_method() {
        let app = app();
        let session = open_session(&app).await;

        let (_, _, body) = send(
            &app,
            Method::POST,
            "/mcp",
            Some(session.as_str()),
            Some(json!([
                {"jsonrpc":"2.0","id":1,"method":"tools/list"},
                {"jsonrpc":"2.0","id":2,"method":"resources/list"}
            ])),
        )
        .await;

        let responses = body.as_array().unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["result"]["tools"].as_array().unwrap().len(), 3);
        assert_eq!(responses[1]["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_price_listing_tool() {
        let app = app();
        let session = open_session(&app).await;
        let body = call_tool(&app, &session, "price-listing", json!({"searchQuery": "enrich"})).await;

        assert_eq!(body["result"]["isError"], false);
        let text = body["result"]["content"][0]["text"].as_str().unwrap();
        let items: Value = serde_json::from_str(text).unwrap();
        let ids: Vec<&str> = items
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["id"].as_str().unwrap())
            .collect();
        assert!(ids.contains(&"enrich-oracle-only"));
        assert!(!ids.contains(&"search-alexandria"));
    }

    #[tokio::test]
    async fn test_make_purchase_tool_returns_order() {
        let app = app();
        let session = open_session(&app).await;
        let body = call_tool(
            &app,
            &session,
            "make-purchase",
            json!({
                "itemId": "oracle-metadata",
                "params": { "artifactId": "met_1" },
                "signedTransaction": "proof",
                "paymentMethod": "USDC_BASE_MAINNET"
            }),
        )
        .await;

        let text = body["result"]["content"][0]["text"].as_str().unwrap();
        let order: Value = serde_json::from_str(text).unwrap();
        assert_eq!(order["purchasableItemId"], "oracle-metadata");
        assert_eq!(order["toolResult"], "Payment failed: insufficient funds");
        assert_eq!(order["originalRequest"]["signedTransaction"], "proof");
        assert!(order["orderId"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[tokio::test]
    async fn test_unknown_tool_and_bad_arguments() {
        let app = app();
        let session = open_session(&app).await;

        let body = call_tool(&app, &session, "refund", json!({})).await;
        assert_eq!(body["error"]["code"], -32602);

        let body = call_tool(&app, &session, "make-purchase", json!({"itemId": 5})).await;
        assert_eq!(body["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn test_missing_wallet_surfaces_as_internal_error() {
        let mut config = config();
        config.wallet_address = None;
        let h = harness_with(config, Ok(SettlementOutcome::settled(None)), Ok(String::new()));
        let app = broker_router_generic(h.broker);
        let session = open_session(&app).await;

        let body = call_tool(
            &app,
            &session,
            "make-purchase",
            json!({"itemId": "search-alexandria", "params": {"query": "x"}, "paymentMethod": "USDC_BASE_MAINNET"}),
        )
        .await;
        assert_eq!(body["error"]["code"], -32603);
        assert!(
            body["error"]["message"]
                .as_str()
                .unwrap()
                .contains("BASE_WALLET_ADDRESS")
        );
    }

    #[tokio::test]
    async fn test_delete_closes_session() {
        let app = app();
        let session = open_session(&app).await;

        let (status, _, _) = send(&app, Method::DELETE, "/mcp", Some(session.as_str()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(active_sessions(&app).await, 0);

        let (status, _, body) = send(
            &app,
            Method::POST,
            "/mcp",
            Some(session.as_str()),
            Some(json!({"jsonrpc":"2.0","id":1,"method":"ping"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], -32000);
    }

    #[tokio::test]
    async fn test_get_mcp() {
        let app = app();
        let (status, _, _) = send(&app, Method::GET, "/mcp", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let session = open_session(&app).await;
        let (status, headers, _) = send(&app, Method::GET, "/mcp", Some(session.as_str()), None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(headers.get("allow").unwrap(), "POST, DELETE");
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let app = app();
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/mcp")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], -32700);
        assert_eq!(active_sessions(&app).await, 0);
    }

    #[tokio::test]
    async fn test_discovery_documents() {
        let app = app();

        let (status, _, body) = send(&app, Method::GET, "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["endpoints"]["mcp"], "/mcp");

        let (_, _, body) = send(&app, Method::GET, "/mcp/schema", None, None).await;
        assert_eq!(body["catalog"].as_array().unwrap().len(), 8);
        assert_eq!(body["tools"].as_array().unwrap().len(), 3);

        let (_, _, body) = send(&app, Method::GET, "/.well-known/mcp.json", None, None).await;
        assert_eq!(body["endpoint"], "http://localhost:3000/mcp");
        assert_eq!(body["transport"], "streamable-http");

        let (_, _, body) = send(&app, Method::GET, "/.well-known/x402", None, None).await;
        assert_eq!(body["network"], "eip155:8453");
        assert_eq!(body["payTo"], WALLET);
        let priced = body["items"].as_array().unwrap();
        assert_eq!(priced.len(), 5);
        assert!(priced.iter().all(|i| i["id"] != "search-alexandria"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_problem_details_404() {
        let app = app();
        let (status, _, body) = send(&app, Method::GET, "/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
        assert_eq!(body["detail"], "No route for /nope");
    }
}

#[cfg(test)]
mod error_tests {
    use crate::error::BrokerError;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use kernel::error::app_error::AppError;
    use kernel::error::kind::ErrorKind;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            BrokerError::MissingSession.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BrokerError::ItemNotFound {
                item_id: "x".into(),
                payment_method: "y".into()
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            BrokerError::Backend("down".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            BrokerError::Configuration("no wallet".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            BrokerError::UnmappedItem("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_configuration_error_carries_action() {
        let app_err: AppError = BrokerError::Configuration("no wallet".into()).into();
        assert_eq!(app_err.kind(), ErrorKind::ServiceUnavailable);
        assert!(app_err.action().is_some());
    }

    #[test]
    fn test_missing_session_response_status() {
        let response = BrokerError::MissingSession.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_item_not_found_message() {
        let err = BrokerError::ItemNotFound {
            item_id: "ghost".into(),
            payment_method: "USDC_BASE_MAINNET".into(),
        };
        assert_eq!(
            err.to_string(),
            "Item not found: 'ghost' is not sold for payment method 'USDC_BASE_MAINNET'"
        );
    }
}

//! x402 Facilitator Clients
//!
//! `HttpFacilitator` talks to a real facilitator: `POST /verify`, then
//! `POST /settle`, both with `{x402Version, paymentPayload,
//! paymentRequirements}`. `TestModeFacilitator` accepts any proof.

use crate::domain::payment::{SettlementOutcome, SettlementRequest};
use crate::domain::ports::PaymentFacilitator;
use crate::error::{BrokerError, BrokerResult};
use reqwest::StatusCode;
use serde_json::{Value, json};

/// Bytes of an unexpected response body kept in a decline message
const BODY_EXCERPT_LEN: usize = 200;

#[derive(Debug, Clone)]
pub struct HttpFacilitator {
    client: reqwest::Client,
}

impl HttpFacilitator {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn post(&self, url: &str, body: &Value) -> BrokerResult<(StatusCode, String)> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(facilitator_error)?;
        let status = response.status();
        let text = response.text().await.map_err(facilitator_error)?;
        Ok((status, text))
    }
}

impl PaymentFacilitator for HttpFacilitator {
    async fn verify_and_settle(
        &self,
        request: &SettlementRequest,
    ) -> BrokerResult<SettlementOutcome> {
        let Some(payload) = decode_proof(&request.proof) else {
            return Ok(SettlementOutcome::declined("Cannot decode payment proof"));
        };
        let body = json!({
            "x402Version": payload.get("x402Version").and_then(Value::as_u64).unwrap_or(1),
            "paymentPayload": payload,
            "paymentRequirements": request.payment_requirements(),
        });
        let base = request.facilitator_url.trim_end_matches('/');

        let (status, text) = self.post(&format!("{}/verify", base), &body).await?;
        if status != StatusCode::OK {
            return Ok(SettlementOutcome::declined(upstream_failure("verify", status, &text)));
        }
        if let Some(reason) = interpret_verify(&text) {
            return Ok(SettlementOutcome::declined(reason));
        }

        let (status, text) = self.post(&format!("{}/settle", base), &body).await?;
        if status != StatusCode::OK {
            return Ok(SettlementOutcome::declined(upstream_failure("settle", status, &text)));
        }
        Ok(interpret_settle(&text))
    }
}

/// Accepts every non-empty proof without contacting anyone
#[derive(Debug, Clone, Default)]
pub struct TestModeFacilitator;

impl PaymentFacilitator for TestModeFacilitator {
    async fn verify_and_settle(
        &self,
        request: &SettlementRequest,
    ) -> BrokerResult<SettlementOutcome> {
        tracing::warn!(
            resource = %request.resource,
            amount = %request.amount,
            "Test mode: accepting payment without settlement"
        );
        Ok(SettlementOutcome::settled(None))
    }
}

fn facilitator_error(err: reqwest::Error) -> BrokerError {
    if err.is_timeout() {
        BrokerError::Facilitator("x402 facilitator timeout".to_string())
    } else {
        BrokerError::Facilitator(err.to_string())
    }
}

fn upstream_failure(step: &str, status: StatusCode, body: &str) -> String {
    let excerpt: String = body.chars().take(BODY_EXCERPT_LEN).collect();
    format!("Facilitator {} failed ({}): {}", step, status.as_u16(), excerpt)
}

/// Base64-encoded JSON, or raw JSON
fn decode_proof(proof: &str) -> Option<Value> {
    platform::crypto::from_base64(proof)
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok())
        .or_else(|| serde_json::from_str::<Value>(proof.trim()).ok())
        .filter(Value::is_object)
}

/// `None` when the proof is valid, otherwise the decline reason
fn interpret_verify(body: &str) -> Option<String> {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return Some("Unexpected facilitator verify response".to_string());
    };
    match value.get("isValid").and_then(Value::as_bool) {
        Some(true) => None,
        _ => Some(
            first_text(&value, &["invalidReason", "error", "message"])
                .unwrap_or_else(|| "Payment verification failed".to_string()),
        ),
    }
}

/// Settlement response: a bare transaction hash, or an object
fn interpret_settle(body: &str) -> SettlementOutcome {
    let value = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(_) => return SettlementOutcome::declined("Unexpected facilitator settle response"),
    };
    match value {
        Value::String(tx) => SettlementOutcome::settled(Some(tx)),
        Value::Object(_) => {
            if value.get("success").and_then(Value::as_bool) == Some(true) {
                let tx = value
                    .get("transaction")
                    .or_else(|| value.get("txHash"))
                    .and_then(|t| match t {
                        Value::String(s) => Some(s.clone()),
                        Value::Object(_) => t.get("txHash").and_then(Value::as_str).map(String::from),
                        _ => None,
                    })
                    .filter(|s| !s.is_empty());
                SettlementOutcome::settled(tx)
            } else {
                SettlementOutcome::declined(
                    first_text(&value, &["errorReason", "error", "message"])
                        .unwrap_or_else(|| "Settlement failed".to_string()),
                )
            }
        }
        _ => SettlementOutcome::declined("Unexpected facilitator settle response"),
    }
}

fn first_text(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(String::from)
}

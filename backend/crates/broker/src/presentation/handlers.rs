//! HTTP Handlers for the `/mcp` endpoint

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;

use platform::client::{extract_client_ip, header_value};

use crate::application::broker::PurchaseBroker;
use crate::application::sessions::SessionRegistry;
use crate::domain::ports::{ContentBackend, PaymentFacilitator};
use crate::error::{BrokerError, BrokerResult};
use crate::presentation::jsonrpc::{
    INVALID_REQUEST, JsonRpcResponse, PARSE_ERROR, is_initialize_request, split_batch,
};
use crate::presentation::protocol::McpServer;

pub const SESSION_HEADER: &str = "mcp-session-id";

/// Shared state for broker handlers
pub struct BrokerAppState<F, B>
where
    F: PaymentFacilitator,
    B: ContentBackend,
{
    pub broker: PurchaseBroker<F, B>,
    pub sessions: Arc<SessionRegistry<McpServer<F, B>>>,
    pub started_at: Instant,
}

impl<F, B> Clone for BrokerAppState<F, B>
where
    F: PaymentFacilitator,
    B: ContentBackend,
{
    fn clone(&self) -> Self {
        Self {
            broker: self.broker.clone(),
            sessions: self.sessions.clone(),
            started_at: self.started_at,
        }
    }
}

impl<F, B> BrokerAppState<F, B>
where
    F: PaymentFacilitator + Send + Sync + 'static,
    B: ContentBackend + Send + Sync + 'static,
{
    pub fn new(broker: PurchaseBroker<F, B>) -> Self {
        Self {
            broker,
            sessions: Arc::new(SessionRegistry::new()),
            started_at: Instant::now(),
        }
    }
}

// ============================================================================
// POST /mcp
// ============================================================================

/// POST /mcp
///
/// Initialization without a session header opens a session; everything else
/// must name a live one.
pub async fn post_mcp<F, B>(
    State(state): State<BrokerAppState<F, B>>,
    headers: HeaderMap,
    body: Bytes,
) -> BrokerResult<Response>
where
    F: PaymentFacilitator + Send + Sync + 'static,
    B: ContentBackend + Send + Sync + 'static,
{
    let body: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            return Ok(rpc_error_response(PARSE_ERROR, format!("Parse error: {}", e)));
        }
    };
    let (messages, is_batch) = split_batch(body);
    if messages.is_empty() {
        return Ok(rpc_error_response(INVALID_REQUEST, "Invalid Request: empty batch"));
    }

    let raw_session = header_value(&headers, SESSION_HEADER);
    let server = match raw_session {
        Some(_) => state.sessions.resolve_header(raw_session).await?.1,
        None if messages.iter().any(is_initialize_request) => {
            let broker = state.broker.clone();
            let (session_id, server) = state
                .sessions
                .create(|id| McpServer::new(id, broker))
                .await;
            tracing::debug!(
                session_id = %session_id,
                client_ip = ?extract_client_ip(&headers, None),
                "Initialization request opened a session"
            );
            server
        }
        None => return Err(BrokerError::MissingSession),
    };

    let mut responses = Vec::with_capacity(messages.len());
    for message in messages {
        if let Some(response) = server.handle(message).await {
            responses.push(response);
        }
    }

    let session_header = HeaderValue::from_str(&server.session_id().to_string())
        .map_err(|e| BrokerError::Internal(e.to_string()))?;
    let headers = [(SESSION_HEADER, session_header)];

    if responses.is_empty() {
        return Ok((StatusCode::ACCEPTED, headers).into_response());
    }
    let body = if is_batch {
        serde_json::to_value(&responses)
    } else {
        serde_json::to_value(&responses[0])
    }
    .map_err(|e| BrokerError::Internal(e.to_string()))?;

    Ok((StatusCode::OK, headers, Json(body)).into_response())
}

// ============================================================================
// GET /mcp
// ============================================================================

/// GET /mcp
///
/// No server-initiated stream is offered; live sessions get 405.
pub async fn get_mcp<F, B>(
    State(state): State<BrokerAppState<F, B>>,
    headers: HeaderMap,
) -> BrokerResult<Response>
where
    F: PaymentFacilitator + Send + Sync + 'static,
    B: ContentBackend + Send + Sync + 'static,
{
    state
        .sessions
        .resolve_header(header_value(&headers, SESSION_HEADER))
        .await?;
    Ok((
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST, DELETE")],
        Json(json!({
            "jsonrpc": "2.0",
            "error": { "code": INVALID_REQUEST, "message": "Server-initiated streams are not supported" },
            "id": null,
        })),
    )
        .into_response())
}

// ============================================================================
// DELETE /mcp
// ============================================================================

/// DELETE /mcp
pub async fn delete_mcp<F, B>(
    State(state): State<BrokerAppState<F, B>>,
    headers: HeaderMap,
) -> BrokerResult<StatusCode>
where
    F: PaymentFacilitator + Send + Sync + 'static,
    B: ContentBackend + Send + Sync + 'static,
{
    let (session_id, _) = state
        .sessions
        .resolve_header(header_value(&headers, SESSION_HEADER))
        .await?;
    state.sessions.close(&session_id).await;
    Ok(StatusCode::OK)
}

fn rpc_error_response(code: i64, message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(JsonRpcResponse::failure(Value::Null, code, message)),
    )
        .into_response()
}

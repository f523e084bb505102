//! Broker Error Types
//!
//! This module provides broker-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.
//!
//! Purchase-path failures (unknown item, declined payment, backend errors)
//! normally never surface as `BrokerError` to a caller: the orchestrator turns
//! them into an order whose result text describes the failure. What does
//! surface is misconfiguration and protocol misuse.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Broker-specific result type alias
pub type BrokerResult<T> = Result<T, BrokerError>;

/// JSON-RPC error code for a missing or unknown session
pub const SESSION_ERROR_CODE: i64 = -32000;
pub const SESSION_ERROR_MESSAGE: &str = "Bad Request: No valid session ID provided";

#[derive(Debug, Error)]
pub enum BrokerError {
    /// Fatal misdeployment, e.g. no receiving wallet
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Non-initialization request without a live session
    #[error("{}", SESSION_ERROR_MESSAGE)]
    MissingSession,

    /// Body is not a usable JSON-RPC message
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Item not found: '{item_id}' is not sold for payment method '{payment_method}'")]
    ItemNotFound {
        item_id: String,
        payment_method: String,
    },

    #[error("missing required parameter '{0}'")]
    MissingParameter(String),

    /// Catalog item with no delivery route: catalog and table drifted apart
    #[error("no delivery route for item '{0}'")]
    UnmappedItem(String),

    #[error("Facilitator error: {0}")]
    Facilitator(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BrokerError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            BrokerError::MissingSession | BrokerError::InvalidMessage(_) => StatusCode::BAD_REQUEST,
            BrokerError::ItemNotFound { .. } => StatusCode::NOT_FOUND,
            BrokerError::MissingParameter(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BrokerError::Facilitator(_) | BrokerError::Backend(_) => StatusCode::BAD_GATEWAY,
            BrokerError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            BrokerError::UnmappedItem(_) | BrokerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BrokerError::MissingSession | BrokerError::InvalidMessage(_) => ErrorKind::BadRequest,
            BrokerError::ItemNotFound { .. } => ErrorKind::NotFound,
            BrokerError::MissingParameter(_) => ErrorKind::UnprocessableEntity,
            BrokerError::Facilitator(_) | BrokerError::Backend(_) => ErrorKind::BadGateway,
            BrokerError::Configuration(_) => ErrorKind::ServiceUnavailable,
            BrokerError::UnmappedItem(_) | BrokerError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Log the error with appropriate level
    pub(crate) fn log(&self) {
        match self {
            BrokerError::Configuration(msg) => {
                tracing::error!(message = %msg, "Broker configuration error");
            }
            BrokerError::UnmappedItem(item_id) => {
                tracing::error!(item_id = %item_id, "Catalog item has no delivery route");
            }
            BrokerError::Internal(msg) => {
                tracing::error!(message = %msg, "Broker internal error");
            }
            BrokerError::Facilitator(msg) | BrokerError::Backend(msg) => {
                tracing::warn!(message = %msg, "Upstream call failed");
            }
            _ => {
                tracing::debug!(error = %self, "Broker error");
            }
        }
    }
}

impl From<BrokerError> for AppError {
    fn from(err: BrokerError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        let app_err = AppError::new(kind, message);
        match err {
            BrokerError::Configuration(_) => {
                app_err.with_action("Set BASE_WALLET_ADDRESS (and other required variables) and restart")
            }
            _ => app_err,
        }
    }
}

impl From<reqwest::Error> for BrokerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BrokerError::Backend(format!("upstream timed out: {}", err))
        } else {
            BrokerError::Backend(err.to_string())
        }
    }
}

impl IntoResponse for BrokerError {
    fn into_response(self) -> Response {
        self.log();
        match self {
            // Session errors answer in JSON-RPC shape so protocol clients can parse them
            BrokerError::MissingSession => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "jsonrpc": "2.0",
                    "error": {
                        "code": SESSION_ERROR_CODE,
                        "message": SESSION_ERROR_MESSAGE,
                    },
                    "id": null,
                })),
            )
                .into_response(),
            other => AppError::from(other).into_response(),
        }
    }
}

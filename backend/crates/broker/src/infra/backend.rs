//! Data Portal Client
//!
//! HTTP implementation of [`ContentBackend`]. The backend's body is relayed
//! verbatim whatever the status code; transport failures are errors.

use crate::domain::delivery::DeliveryRequest;
use crate::domain::ports::ContentBackend;
use crate::error::BrokerResult;
use reqwest::header::HeaderValue;

/// Header carrying the caller's payment proof to the backend
pub const PAYMENT_HEADER: &str = "X-PAYMENT";

#[derive(Debug, Clone)]
pub struct HttpContentBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpContentBackend {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl ContentBackend for HttpContentBackend {
    async fn fetch(
        &self,
        request: &DeliveryRequest,
        payment_proof: Option<&str>,
    ) -> BrokerResult<String> {
        let url = request.url(&self.base_url)?;
        let mut builder = self.client.request(request.method.clone(), url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(value) = payment_proof.and_then(payment_header) {
            builder = builder.header(PAYMENT_HEADER, value);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                path = %request.path_and_query(),
                "Backend returned an error status; relaying body"
            );
        }
        Ok(body)
    }
}

/// The proof as a header value; proofs that cannot travel in a header are
/// dropped so delivery still goes ahead without them
fn payment_header(proof: &str) -> Option<HeaderValue> {
    match HeaderValue::from_str(proof) {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(
                proof = %platform::crypto::fingerprint(proof),
                "Payment proof is not a valid header value; not forwarding it"
            );
            None
        }
    }
}

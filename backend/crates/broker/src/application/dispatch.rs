//! Delivery Dispatcher
//!
//! Resolves an item's request template, fills it in and relays the backend's
//! raw response body.

use crate::domain::delivery::route_for;
use crate::domain::ports::ContentBackend;
use crate::error::{BrokerError, BrokerResult};
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct DeliveryDispatcher<B>
where
    B: ContentBackend,
{
    backend: Arc<B>,
}

impl<B> DeliveryDispatcher<B>
where
    B: ContentBackend + Send + Sync,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Fulfil `item_id`, forwarding `payment_proof` when one was supplied
    ///
    /// The response body is returned as-is, backend error text included.
    pub async fn deliver(
        &self,
        item_id: &str,
        params: &BTreeMap<String, String>,
        payment_proof: Option<&str>,
    ) -> BrokerResult<String> {
        let route =
            route_for(item_id).ok_or_else(|| BrokerError::UnmappedItem(item_id.to_string()))?;
        let request = route.build(params)?;

        tracing::info!(
            item_id = %item_id,
            method = %request.method,
            path = %request.path_and_query(),
            proof_forwarded = payment_proof.is_some(),
            "Dispatching delivery"
        );

        self.backend.fetch(&request, payment_proof).await
    }
}

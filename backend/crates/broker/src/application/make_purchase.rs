//! Make Purchase Use Case
//!
//! The purchase state machine:
//!
//! ```text
//! Received -> ItemResolved -> Unpriced -------------------------> Delivered | DeliveryFailed
//!          |               \-> PaymentPending -> Verified ------^
//!          |                                  \-> PaymentFailed
//!          \-> Rejected
//! ```
//!
//! Every terminal state becomes an [`Order`] with a fresh order id. The only
//! error that escapes is a missing receiving wallet, checked before anything
//! else runs.

use crate::application::config::BrokerConfig;
use crate::application::dispatch::DeliveryDispatcher;
use crate::application::verify_payment::PaymentVerifier;
use crate::domain::catalog::Catalog;
use crate::domain::entities::{Order, PurchasableItem, PurchaseRequest, PurchaseStage};
use crate::domain::payment::resource_for;
use crate::domain::ports::{ContentBackend, PaymentFacilitator};
use crate::error::{BrokerError, BrokerResult};
use std::sync::Arc;

/// Intermediate and terminal states of one purchase
#[derive(Debug)]
enum PurchaseState<'a> {
    Received,
    ItemResolved(&'a PurchasableItem),
    Unpriced(&'a PurchasableItem),
    PaymentPending(&'a PurchasableItem),
    Verified(&'a PurchasableItem),
    PaymentFailed(String),
    Delivered(String),
    DeliveryFailed(String),
    Rejected(String),
}

impl PurchaseState<'_> {
    fn into_terminal(self) -> Option<(PurchaseStage, String)> {
        match self {
            PurchaseState::Delivered(body) => Some((PurchaseStage::Delivered, body)),
            PurchaseState::DeliveryFailed(msg) => Some((PurchaseStage::DeliveryFailed, msg)),
            PurchaseState::PaymentFailed(msg) => Some((PurchaseStage::PaymentFailed, msg)),
            PurchaseState::Rejected(msg) => Some((PurchaseStage::Rejected, msg)),
            _ => None,
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(
            self,
            PurchaseState::Delivered(_)
                | PurchaseState::DeliveryFailed(_)
                | PurchaseState::PaymentFailed(_)
                | PurchaseState::Rejected(_)
        )
    }
}

/// Make Purchase Use Case
pub struct MakePurchaseUseCase<F, B>
where
    F: PaymentFacilitator,
    B: ContentBackend,
{
    catalog: Arc<Catalog>,
    verifier: PaymentVerifier<F>,
    dispatcher: DeliveryDispatcher<B>,
    config: Arc<BrokerConfig>,
}

impl<F, B> MakePurchaseUseCase<F, B>
where
    F: PaymentFacilitator + Send + Sync,
    B: ContentBackend + Send + Sync,
{
    pub fn new(
        catalog: Arc<Catalog>,
        facilitator: Arc<F>,
        backend: Arc<B>,
        config: Arc<BrokerConfig>,
    ) -> Self {
        Self {
            catalog,
            verifier: PaymentVerifier::new(facilitator),
            dispatcher: DeliveryDispatcher::new(backend),
            config,
        }
    }

    pub async fn execute(&self, request: PurchaseRequest) -> BrokerResult<Order> {
        let wallet = match self.config.require_wallet() {
            Ok(wallet) => wallet,
            Err(e) => {
                e.log();
                return Err(e);
            }
        };

        let mut state = PurchaseState::Received;
        while !state.is_terminal() {
            state = self.step(state, &request, wallet).await;
        }

        let (stage, tool_result) = state
            .into_terminal()
            .ok_or_else(|| BrokerError::Internal("purchase ended in a non-terminal state".into()))?;
        let order = Order::new(request, stage, tool_result);

        match stage {
            PurchaseStage::Delivered => tracing::info!(
                order_id = %order.order_id,
                item_id = %order.purchasable_item_id,
                "Purchase delivered"
            ),
            PurchaseStage::Rejected => tracing::info!(
                order_id = %order.order_id,
                item_id = %order.purchasable_item_id,
                "Purchase rejected: item not found"
            ),
            PurchaseStage::PaymentFailed | PurchaseStage::DeliveryFailed => tracing::warn!(
                order_id = %order.order_id,
                item_id = %order.purchasable_item_id,
                stage = ?stage,
                result = %order.tool_result,
                "Purchase failed"
            ),
        }

        Ok(order)
    }

    async fn step<'a>(
        &'a self,
        state: PurchaseState<'a>,
        request: &PurchaseRequest,
        wallet: &str,
    ) -> PurchaseState<'a> {
        match state {
            PurchaseState::Received => {
                match self.catalog.find(&request.item_id, &request.payment_method) {
                    Some(item) => PurchaseState::ItemResolved(item),
                    None => PurchaseState::Rejected(
                        BrokerError::ItemNotFound {
                            item_id: request.item_id.clone(),
                            payment_method: request.payment_method.clone(),
                        }
                        .to_string(),
                    ),
                }
            }
            PurchaseState::ItemResolved(item) => {
                if item.price.is_free() {
                    PurchaseState::Unpriced(item)
                } else {
                    PurchaseState::PaymentPending(item)
                }
            }
            PurchaseState::PaymentPending(item) => {
                let result = self
                    .verifier
                    .verify_and_settle(
                        item.price,
                        wallet,
                        &request.signed_transaction,
                        &self.config.facilitator_url,
                        &resource_for(&self.config.public_base_url, item.id),
                        item.price.payment_method(),
                        item.name,
                    )
                    .await;
                if result.success {
                    PurchaseState::Verified(item)
                } else {
                    PurchaseState::PaymentFailed(match result.message {
                        Some(reason) => format!("Payment failed: {}", reason),
                        None => "Payment failed".to_string(),
                    })
                }
            }
            PurchaseState::Unpriced(item) | PurchaseState::Verified(item) => {
                // Proof is forwarded even for free items; the backend may gate on its own
                match self
                    .dispatcher
                    .deliver(item.id, &request.params, request.payment_proof())
                    .await
                {
                    Ok(body) => PurchaseState::Delivered(body),
                    Err(e) => {
                        e.log();
                        PurchaseState::DeliveryFailed(format!("Delivery failed: {}", e))
                    }
                }
            }
            terminal => terminal,
        }
    }
}

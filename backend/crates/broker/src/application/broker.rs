//! Purchase Broker
//!
//! Process-wide facade shared by every session: the catalog, the two
//! upstream collaborators and the configuration. Sessions hold an `Arc` to
//! one broker; nothing here is per-session.

use crate::application::config::BrokerConfig;
use crate::application::make_purchase::MakePurchaseUseCase;
use crate::domain::catalog::Catalog;
use crate::domain::entities::{Order, PaymentMethodDescriptor, PurchasableItem, PurchaseRequest};
use crate::domain::ports::{ContentBackend, PaymentFacilitator};
use crate::error::BrokerResult;
use std::sync::Arc;

pub struct PurchaseBroker<F, B>
where
    F: PaymentFacilitator,
    B: ContentBackend,
{
    catalog: Arc<Catalog>,
    facilitator: Arc<F>,
    backend: Arc<B>,
    config: Arc<BrokerConfig>,
}

// Manual impl: only the Arcs are cloned
impl<F, B> Clone for PurchaseBroker<F, B>
where
    F: PaymentFacilitator,
    B: ContentBackend,
{
    fn clone(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
            facilitator: self.facilitator.clone(),
            backend: self.backend.clone(),
            config: self.config.clone(),
        }
    }
}

impl<F, B> PurchaseBroker<F, B>
where
    F: PaymentFacilitator + Send + Sync,
    B: ContentBackend + Send + Sync,
{
    /// Broker over the production catalog, paying out to the configured wallet
    pub fn new(facilitator: F, backend: B, config: BrokerConfig) -> Self {
        let catalog = Catalog::alexandria(config.wallet_or_empty());
        Self::with_catalog(catalog, facilitator, backend, config)
    }

    pub fn with_catalog(catalog: Catalog, facilitator: F, backend: B, config: BrokerConfig) -> Self {
        Self {
            catalog: Arc::new(catalog),
            facilitator: Arc::new(facilitator),
            backend: Arc::new(backend),
            config: Arc::new(config),
        }
    }

    /// `price-listing`: optionally filtered by a case-insensitive query
    pub fn price_listing(&self, query: Option<&str>) -> Vec<&PurchasableItem> {
        self.catalog.list(query)
    }

    /// `payment-methods`: accepted rails with their receiving wallets
    pub fn payment_methods(&self) -> &[PaymentMethodDescriptor] {
        self.catalog.payment_methods()
    }

    /// `make-purchase`: see [`MakePurchaseUseCase`]
    pub async fn make_purchase(&self, request: PurchaseRequest) -> BrokerResult<Order> {
        let use_case = MakePurchaseUseCase::new(
            self.catalog.clone(),
            self.facilitator.clone(),
            self.backend.clone(),
            self.config.clone(),
        );
        use_case.execute(request).await
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }
}

//! Catalog & Pricing Registry
//!
//! Static list of purchasable Alexandria Aeternum products. Built once at
//! startup and shared read-only; no lock is needed.

use crate::domain::entities::{PaymentMethodDescriptor, PurchasableItem};
use crate::domain::value_objects::{PaymentMethod, Price};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Read-only product registry
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<PurchasableItem>,
    payment_methods: Vec<PaymentMethodDescriptor>,
}

impl Catalog {
    pub fn new(items: Vec<PurchasableItem>, payment_methods: Vec<PaymentMethodDescriptor>) -> Self {
        Self {
            items,
            payment_methods,
        }
    }

    /// The production catalog, paying out to `wallet`
    ///
    /// An empty wallet is accepted here; the purchase flow refuses to run
    /// without one.
    pub fn alexandria(wallet: &str) -> Self {
        let payment_methods = PaymentMethod::ALL
            .into_iter()
            .map(|payment_method| PaymentMethodDescriptor {
                wallet: wallet.to_string(),
                payment_method,
            })
            .collect();
        Self::new(alexandria_items(), payment_methods)
    }

    /// Full catalog in declaration order, or only the items whose name or
    /// description contains `query` (case-insensitive)
    pub fn list(&self, query: Option<&str>) -> Vec<&PurchasableItem> {
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            None => self.items.iter().collect(),
            Some(q) => {
                let q = q.to_lowercase();
                self.items.iter().filter(|item| item.matches(&q)).collect()
            }
        }
    }

    /// Exact match on both id and payment method tag
    ///
    /// An item that exists under another payment method is not found.
    pub fn find(&self, item_id: &str, payment_method: &str) -> Option<&PurchasableItem> {
        self.items.iter().find(|item| {
            item.id == item_id && item.price.payment_method().as_str() == payment_method
        })
    }

    pub fn payment_methods(&self) -> &[PaymentMethodDescriptor] {
        &self.payment_methods
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn usdc(amount: Decimal) -> Price {
    // Literal prices below are all non-negative
    Price::new(amount, PaymentMethod::UsdcBaseMainnet)
        .unwrap_or_else(|| Price::free(PaymentMethod::UsdcBaseMainnet))
}

fn alexandria_items() -> Vec<PurchasableItem> {
    vec![
        PurchasableItem {
            id: "search-alexandria",
            name: "Search Alexandria Aeternum",
            description: "Free-text search across 2M+ museum artworks from 7 institutions. \
                          Returns artifact ids, titles, artists, dates and classification.",
            price: usdc(dec!(0)),
            params: &[
                ("query", "Free-text search, e.g. \"impressionist landscape\""),
                (
                    "museum",
                    "Optional museum filter: met, nga, chicago, cleveland, rijksmuseum, smithsonian, paris",
                ),
                ("limit", "Optional max results (default 20, max 100)"),
            ],
        },
        PurchasableItem {
            id: "curated-metadata",
            name: "Human_Standard Curated Metadata",
            description: "500-1,200 tokens of human-sourced metadata plus a signed image URL. \
                          Zero synthetic content. Free for 5 requests per day.",
            price: usdc(dec!(0)),
            params: &[("artifactId", "Artifact id, e.g. met_10049")],
        },
        PurchasableItem {
            id: "oracle-metadata",
            name: "Hybrid_Premium Oracle Metadata",
            description: "2,000-6,000 tokens of VLM deep visual analysis: composition, palette, \
                          symbolism and emotional journey, plus a signed image URL.",
            price: usdc(dec!(0.20)),
            params: &[("artifactId", "Artifact id, e.g. met_10049")],
        },
        PurchasableItem {
            id: "batch-download",
            name: "Batch Dataset Download",
            description: "Bulk metadata and image download links for a set of records \
                          from one museum dataset. Links expire after 2 hours.",
            price: usdc(dec!(5.00)),
            params: &[
                ("imageIds", "Comma-separated image ids"),
                ("datasetId", "Dataset id, e.g. met-museum or rijksmuseum"),
            ],
        },
        PurchasableItem {
            id: "compliance-manifest",
            name: "Compliance Manifest",
            description: "California AB 2013 and EU AI Act Article 53 provenance manifests \
                          for a dataset.",
            price: usdc(dec!(0)),
            params: &[
                ("datasetId", "Dataset id, e.g. met-museum"),
                ("regulation", "Optional: ab2013, eu_ai_act or all (default all)"),
            ],
        },
        PurchasableItem {
            id: "enrich-oracle-only",
            name: "Golden Codex Enrichment: Oracle Reading",
            description: "111-field Hybrid_Premium reading of your own image. \
                          Returns Golden Codex JSON.",
            price: usdc(dec!(0.20)),
            params: ENRICH_PARAMS,
        },
        PurchasableItem {
            id: "enrich-oracle-plus-infuse",
            name: "Golden Codex Enrichment: Oracle + Infusion",
            description: "Oracle reading plus XMP metadata infusion and a hash registry entry \
                          for your own image.",
            price: usdc(dec!(0.30)),
            params: ENRICH_PARAMS,
        },
        PurchasableItem {
            id: "enrich-full-certified",
            name: "Golden Codex Enrichment: Full Certified",
            description: "Oracle reading, infusion, C2PA Content Credentials and hash registry \
                          for your own image.",
            price: usdc(dec!(0.50)),
            params: ENRICH_PARAMS,
        },
    ]
}

const ENRICH_PARAMS: &[(&str, &str)] = &[
    ("imageUrl", "Public URL of the image to enrich"),
    ("callbackUrl", "Optional webhook URL notified on completion"),
];

//! Delivery table
//!
//! Data-driven mapping from catalog item id to the content backend request
//! that fulfils it. Adding a product means adding a row here and a catalog
//! entry.

use crate::error::{BrokerError, BrokerResult};
use http::Method;
use reqwest::Url;
use serde_json::{Value, json};
use std::collections::BTreeMap;

const DEFAULT_SEARCH_LIMIT: u32 = 20;
const MAX_SEARCH_LIMIT: u32 = 100;

/// Request template family for one item id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryRoute {
    /// `GET /agent/search?q=..&limit=..[&museum=..]`
    Search,
    /// `GET /agent/artifact/<id>`
    Artifact,
    /// `GET /agent/artifact/<id>/oracle`
    Oracle,
    /// `POST /agent/batch` with `{image_ids, dataset_id}`
    Batch,
    /// `GET /agent/compliance/<dataset_id>?regulation=..`
    Compliance,
    /// `POST /enrich` with `{image_url, tier, callback_url}`
    Enrich { tier: &'static str },
}

/// Item id -> route. Must stay in sync with the catalog.
pub const DELIVERY_TABLE: &[(&str, DeliveryRoute)] = &[
    ("search-alexandria", DeliveryRoute::Search),
    ("curated-metadata", DeliveryRoute::Artifact),
    ("oracle-metadata", DeliveryRoute::Oracle),
    ("batch-download", DeliveryRoute::Batch),
    ("compliance-manifest", DeliveryRoute::Compliance),
    (
        "enrich-oracle-only",
        DeliveryRoute::Enrich {
            tier: "oracle_only",
        },
    ),
    (
        "enrich-oracle-plus-infuse",
        DeliveryRoute::Enrich {
            tier: "oracle_plus_infuse",
        },
    ),
    (
        "enrich-full-certified",
        DeliveryRoute::Enrich {
            tier: "full_certified",
        },
    ),
];

pub fn route_for(item_id: &str) -> Option<DeliveryRoute> {
    DELIVERY_TABLE
        .iter()
        .find(|(id, _)| *id == item_id)
        .map(|(_, route)| *route)
}

/// Concrete backend request, relative to the backend base URL
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl DeliveryRequest {
    fn get(segments: &[&str]) -> Self {
        Self {
            method: Method::GET,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    fn post(segments: &[&str], body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::get(segments)
        }
    }

    fn with_query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// Absolute URL under `base`; path segments are percent-encoded
    pub fn url(&self, base: &str) -> BrokerResult<Url> {
        let mut url = Url::parse(base).map_err(|e| {
            BrokerError::Configuration(format!("invalid backend URL '{}': {}", base, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                BrokerError::Configuration(format!("backend URL '{}' cannot be a base", base))
            })?
            .pop_if_empty()
            .extend(&self.segments);
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }

    /// `/path?query` form, for logs
    pub fn path_and_query(&self) -> String {
        match self.url("http://backend.invalid") {
            Ok(url) => match url.query() {
                Some(q) => format!("{}?{}", url.path(), q),
                None => url.path().to_string(),
            },
            Err(_) => format!("/{}", self.segments.join("/")),
        }
    }
}

impl DeliveryRoute {
    /// Substitute caller parameters into the template
    ///
    /// Only presence of required parameters is checked.
    pub fn build(&self, params: &BTreeMap<String, String>) -> BrokerResult<DeliveryRequest> {
        let request = match self {
            DeliveryRoute::Search => {
                let query = required(params, "query")?;
                let limit = optional(params, "limit")
                    .and_then(|l| l.parse::<u32>().ok())
                    .unwrap_or(DEFAULT_SEARCH_LIMIT)
                    .min(MAX_SEARCH_LIMIT);
                let request = DeliveryRequest::get(&["agent", "search"])
                    .with_query("q", query)
                    .with_query("limit", limit.to_string());
                match optional(params, "museum") {
                    Some(museum) => request.with_query("museum", museum),
                    None => request,
                }
            }
            DeliveryRoute::Artifact => {
                let artifact_id = required(params, "artifactId")?;
                DeliveryRequest::get(&["agent", "artifact", artifact_id])
            }
            DeliveryRoute::Oracle => {
                let artifact_id = required(params, "artifactId")?;
                DeliveryRequest::get(&["agent", "artifact", artifact_id, "oracle"])
            }
            DeliveryRoute::Batch => {
                let image_ids: Vec<&str> = required(params, "imageIds")?
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .collect();
                let dataset_id = required(params, "datasetId")?;
                DeliveryRequest::post(
                    &["agent", "batch"],
                    json!({ "image_ids": image_ids, "dataset_id": dataset_id }),
                )
            }
            DeliveryRoute::Compliance => {
                let dataset_id = required(params, "datasetId")?;
                let regulation = optional(params, "regulation").unwrap_or("all");
                DeliveryRequest::get(&["agent", "compliance", dataset_id])
                    .with_query("regulation", regulation)
            }
            DeliveryRoute::Enrich { tier } => {
                let image_url = required(params, "imageUrl")?;
                let callback_url = optional(params, "callbackUrl");
                DeliveryRequest::post(
                    &["enrich"],
                    json!({
                        "image_url": image_url,
                        "tier": tier,
                        "callback_url": callback_url,
                    }),
                )
            }
        };
        Ok(request)
    }
}

fn optional<'a>(params: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn required<'a>(params: &'a BTreeMap<String, String>, name: &str) -> BrokerResult<&'a str> {
    optional(params, name).ok_or_else(|| BrokerError::MissingParameter(name.to_string()))
}

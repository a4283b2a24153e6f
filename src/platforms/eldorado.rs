//! Eldorado marketplace integration.
//!
//! Read-only search over the public offers endpoint.
//!
//! Endpoint: `GET {base_url}/api/flexibleOffers`
//! Sorting: `offerSortingCriterion=Price&isAscending=true`
//! Auth: not required for reads.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ListingSource, SearchPage, SearchRequest};
use crate::config::MarketplaceConfig;
use crate::types::{Modifier, RawListing};

const OFFERS_PATH: &str = "/api/flexibleOffers";
const REQUEST_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// API response types (Eldorado JSON -> Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OffersResponse {
    #[serde(default)]
    results: Vec<OfferEnvelope>,
    #[serde(default)]
    total_pages: Option<u32>,
    #[serde(default)]
    record_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OfferEnvelope {
    offer: Offer,
    #[serde(default)]
    user: Option<OfferUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Offer {
    id: String,
    #[serde(default)]
    offer_title: String,
    #[serde(rename = "pricePerUnitInUSD")]
    price_per_unit: Option<Money>,
    #[serde(default)]
    trade_environment_values: Vec<NameValue>,
    #[serde(default)]
    offer_attribute_id_values: Vec<NameValue>,
}

#[derive(Debug, Deserialize)]
struct Money {
    amount: Decimal,
}

#[derive(Debug, Deserialize)]
struct NameValue {
    #[serde(default)]
    name: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct OfferUser {
    #[serde(default)]
    username: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Eldorado marketplace client.
pub struct EldoradoClient {
    http: Client,
    base_url: String,
    game_id: String,
    category: String,
    name: String,
}

impl EldoradoClient {
    pub fn new(cfg: &MarketplaceConfig, api_key: Option<String>) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        if let Some(key) = api_key {
            let value = reqwest::header::HeaderValue::from_str(&key)
                .context("Eldorado API key is not a valid header value")?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(cfg.user_agent.clone())
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client for Eldorado")?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            game_id: cfg.game_id.clone(),
            category: cfg.category.clone(),
            name: cfg.name.clone(),
        })
    }

    /// Query parameters for one search page.
    fn query_params(&self, req: &SearchRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("gameId", self.game_id.clone()),
            ("category", self.category.clone()),
            ("tradeEnvironmentValue0", "Brainrot".to_string()),
            ("pageSize", req.page_size.to_string()),
            ("pageIndex", req.page.max(1).to_string()),
            ("offerSortingCriterion", "Price".to_string()),
            ("isAscending", "true".to_string()),
        ];

        if let Some(name) = &req.item_name {
            params.push(("tradeEnvironmentValue2", name.clone()));
        }
        if let Some(q) = &req.text_query {
            params.push(("searchQuery", q.clone()));
        }

        let attributes: Vec<&str> = req
            .bucket
            .as_deref()
            .into_iter()
            .chain(req.rarity.map(modifier_attribute_id))
            .collect();
        if !attributes.is_empty() {
            params.push(("offerAttributeIdsCsv", attributes.join(",")));
        }
        params
    }

    fn to_raw_listing(envelope: OfferEnvelope) -> Option<RawListing> {
        let offer = envelope.offer;
        let Some(price) = offer.price_per_unit.map(|m| m.amount) else {
            warn!(offer_id = %offer.id, "Offer without a unit price skipped");
            return None;
        };

        let tags = offer
            .trade_environment_values
            .into_iter()
            .chain(offer.offer_attribute_id_values)
            .filter(|nv| !nv.name.is_empty())
            .map(|nv| (nv.name, nv.value))
            .collect();

        Some(RawListing {
            id: offer.id,
            title: offer.offer_title,
            price,
            tags,
            seller: envelope.user.map(|u| u.username).unwrap_or_default(),
        })
    }
}

/// Marketplace attribute id for a rarity modifier filter.
pub fn modifier_attribute_id(modifier: Modifier) -> &'static str {
    match modifier {
        Modifier::Gold => "1-1",
        Modifier::Diamond => "1-2",
        Modifier::Bloodrot => "1-3",
        Modifier::Candy => "1-4",
        Modifier::Lava => "1-5",
        Modifier::Galaxy => "1-6",
        Modifier::YinYang => "1-7",
        Modifier::Radioactive => "1-8",
        Modifier::Rainbow => "1-9",
        Modifier::Cursed => "1-10",
    }
}

#[async_trait]
impl ListingSource for EldoradoClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
        let url = format!("{}{OFFERS_PATH}", self.base_url);
        let params = self.query_params(request);

        debug!(
            page = request.page,
            item = ?request.item_name,
            bucket = ?request.bucket,
            "Fetching Eldorado offers"
        );

        let resp = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .context("Eldorado API request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Eldorado API error {status}: {body}");
        }

        let body: OffersResponse = resp
            .json()
            .await
            .context("Failed to parse Eldorado offers response")?;

        let listings: Vec<RawListing> = body
            .results
            .into_iter()
            .filter_map(Self::to_raw_listing)
            .collect();

        debug!(
            page = request.page,
            count = listings.len(),
            total_pages = ?body.total_pages,
            "Eldorado page fetched"
        );

        Ok(SearchPage {
            listings,
            total_pages: body.total_pages,
            record_count: body.record_count,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Listing scanner.
//!
//! Fetches one page of competitor listings for a pricing query, parses each
//! title and keeps only listings that can take part in a bracket: same
//! item, fixed income, exact rarity, positive price, not our own.
//!
//! A failed or timed-out fetch never propagates: the page comes back
//! `degraded` and empty, and the controller decides what to do next.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::buckets::IncomeBucket;
use crate::catalog::{normalize_name, CatalogMatcher};
use crate::config::AppConfig;
use crate::parser::TitleParser;
use crate::platforms::{ListingSource, SearchPage, SearchRequest};
use crate::types::{Listing, PricingQuery, RawListing};

/// Page size cap accepted by the marketplace.
const MAX_PAGE_SIZE: u32 = 50;

// ---------------------------------------------------------------------------
// Settings & results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ScannerSettings {
    pub page_size: u32,
    pub fetch_timeout: Duration,
    pub item_tag_key: String,
    pub modifier_tag_key: String,
    /// Lowercased title/seller substrings that mark our own listings.
    pub own_store_markers: Vec<String>,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl ScannerSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            page_size: cfg.pricer.page_size.clamp(1, MAX_PAGE_SIZE),
            fetch_timeout: Duration::from_secs(cfg.pricer.fetch_timeout_secs.max(1)),
            item_tag_key: cfg.marketplace.item_tag_key.clone(),
            modifier_tag_key: cfg.marketplace.modifier_tag_key.clone(),
            own_store_markers: cfg
                .marketplace
                .own_store_markers
                .iter()
                .map(|m| m.to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }
}

/// How the item name narrows the marketplace search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameScope {
    /// Exact item-name category filter.
    Item,
    /// Item name as a free-text search query.
    Text,
    /// No name restriction; matching happens locally.
    Open,
}

impl NameScope {
    /// Next, looser scope; `None` once the search is already open.
    pub fn widen(self) -> Option<Self> {
        match self {
            NameScope::Item => Some(NameScope::Text),
            NameScope::Text => Some(NameScope::Open),
            NameScope::Open => None,
        }
    }
}

/// Which page to scan and how to scope the search.
#[derive(Debug, Clone, Copy)]
pub struct ScanScope<'a> {
    /// 1-based page index.
    pub page: u32,
    pub bucket: Option<&'a IncomeBucket>,
    pub name_scope: NameScope,
}

/// Why listings were dropped from a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub kept: u32,
    pub other_item: u32,
    pub range: u32,
    pub parse_miss: u32,
    pub rarity_mismatch: u32,
    pub bad_price: u32,
    pub own_store: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    /// Kept listings, in source (price-ascending) order.
    pub listings: Vec<Listing>,
    pub total_pages: Option<u32>,
    /// Results returned by the source before filtering.
    pub raw_count: usize,
    /// The fetch failed, timed out or returned garbage.
    pub degraded: bool,
    pub stats: ScanStats,
}

impl ScanPage {
    fn degraded() -> Self {
        Self {
            degraded: true,
            ..Self::default()
        }
    }

    /// Whether no further pages exist after `page`.
    pub fn is_last(&self, page: u32) -> bool {
        self.raw_count == 0 || self.total_pages.is_some_and(|total| page >= total)
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

pub struct ListingScanner {
    source: Arc<dyn ListingSource>,
    matcher: Arc<CatalogMatcher>,
    settings: ScannerSettings,
}

impl ListingScanner {
    pub fn new(
        source: Arc<dyn ListingSource>,
        matcher: Arc<CatalogMatcher>,
        settings: ScannerSettings,
    ) -> Self {
        Self {
            source,
            matcher,
            settings,
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Fetch and filter one page.
    pub async fn scan(&self, query: &PricingQuery, scope: &ScanScope<'_>) -> ScanPage {
        let request = SearchRequest::new(scope.page, self.settings.page_size)
            .with_item((scope.name_scope == NameScope::Item).then_some(query.entry.name.as_str()))
            .with_text((scope.name_scope == NameScope::Text).then_some(query.entry.name.as_str()))
            .with_bucket(scope.bucket.map(|b| b.attribute_id.as_str()))
            .with_rarity(query.rarity);

        let fetched: SearchPage =
            match tokio::time::timeout(self.settings.fetch_timeout, self.source.search(&request)).await {
                Ok(Ok(page)) => page,
                Ok(Err(e)) => {
                    warn!(
                        source = %self.source.name(),
                        page = scope.page,
                        error = %e,
                        "Page fetch failed, treating as empty"
                    );
                    return ScanPage::degraded();
                }
                Err(_) => {
                    warn!(
                        source = %self.source.name(),
                        page = scope.page,
                        timeout_secs = self.settings.fetch_timeout.as_secs(),
                        "Page fetch timed out, treating as empty"
                    );
                    return ScanPage::degraded();
                }
            };

        let raw_count = fetched.listings.len();
        let (listings, stats) = self.filter_page(query, fetched.listings, scope.page);

        debug!(
            entry = %query.entry.name,
            page = scope.page,
            raw = raw_count,
            kept = stats.kept,
            ranges = stats.range,
            parse_misses = stats.parse_miss,
            rarity_mismatches = stats.rarity_mismatch,
            other_items = stats.other_item,
            "Page scanned"
        );

        ScanPage {
            listings,
            total_pages: fetched.total_pages,
            raw_count,
            degraded: false,
            stats,
        }
    }

    /// Parse and filter raw results. Order is preserved.
    pub fn filter_page(
        &self,
        query: &PricingQuery,
        raw: Vec<RawListing>,
        page: u32,
    ) -> (Vec<Listing>, ScanStats) {
        let parser = TitleParser::for_item(&query.entry.name, &self.settings.modifier_tag_key);
        let mut stats = ScanStats::default();
        let mut kept = Vec::with_capacity(raw.len());

        for listing in raw {
            if !self.is_same_item(query, &listing) {
                stats.other_item += 1;
                continue;
            }
            if self.is_own_listing(&listing) {
                stats.own_store += 1;
                continue;
            }
            if listing.price <= rust_decimal::Decimal::ZERO {
                stats.bad_price += 1;
                continue;
            }

            let parsed = parser.parse_listing(&listing);
            if parsed.is_range {
                stats.range += 1;
                continue;
            }
            if parsed.income_rate.is_none() {
                stats.parse_miss += 1;
                continue;
            }
            if parsed.rarity != query.rarity {
                stats.rarity_mismatch += 1;
                continue;
            }

            stats.kept += 1;
            kept.push(Listing::from_raw(listing, parsed, page));
        }

        (kept, stats)
    }

    fn is_same_item(&self, query: &PricingQuery, listing: &RawListing) -> bool {
        let wanted = normalize_name(&query.entry.name);
        let by_tag = listing
            .tag(&self.settings.item_tag_key)
            .and_then(|value| self.matcher.resolve(value))
            .is_some_and(|entry| normalize_name(&entry.name) == wanted);

        by_tag || self.matcher.mentions(&listing.title, &query.entry)
    }

    fn is_own_listing(&self, listing: &RawListing) -> bool {
        let title = listing.title.to_lowercase();
        let seller = listing.seller.to_lowercase();
        self.settings
            .own_store_markers
            .iter()
            .any(|marker| title.contains(marker.as_str()) || seller == *marker)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

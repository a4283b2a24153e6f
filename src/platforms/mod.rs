//! Listing source integrations.
//!
//! Defines the `ListingSource` trait and the Eldorado marketplace client.
//! Sources are read-only: paginated search, no writes.

pub mod eldorado;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{Modifier, RawListing};

/// One page request against a listing source. Pages are 1-based and
/// results are always sorted by unit price ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Item name filter (exact category value on the marketplace).
    pub item_name: Option<String>,
    /// Free-text query.
    pub text_query: Option<String>,
    /// Income bucket attribute id.
    pub bucket: Option<String>,
    pub rarity: Option<Modifier>,
    pub page: u32,
    pub page_size: u32,
}

impl SearchRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            item_name: None,
            text_query: None,
            bucket: None,
            rarity: None,
            page,
            page_size,
        }
    }

    pub fn with_item(mut self, name: Option<&str>) -> Self {
        self.item_name = name.map(str::to_string);
        self
    }

    pub fn with_text(mut self, query: Option<&str>) -> Self {
        self.text_query = query.map(str::to_string);
        self
    }

    pub fn with_bucket(mut self, attribute_id: Option<&str>) -> Self {
        self.bucket = attribute_id.map(str::to_string);
        self
    }

    pub fn with_rarity(mut self, rarity: Option<Modifier>) -> Self {
        self.rarity = rarity;
        self
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub listings: Vec<RawListing>,
    /// Total page count reported by the source, when it reports one.
    pub total_pages: Option<u32>,
    pub record_count: Option<u32>,
}

/// Abstraction over marketplaces that can be searched for competitor listings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch one page of listings, cheapest first.
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage>;

    /// Source name for logging and identification.
    fn name(&self) -> &str;
}

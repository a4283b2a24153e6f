//! Mock listing source for integration testing.
//!
//! Provides a deterministic `ListingSource` that serves fixed pages per
//! income bucket and records every request, all in-memory with no
//! network access.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use undercut::platforms::{ListingSource, SearchPage, SearchRequest};
use undercut::types::RawListing;

/// Bucket key used for requests without a bucket filter.
const NO_BUCKET: &str = "*";

/// A mock marketplace with per-bucket pages.
///
/// Pages are served as given; callers are responsible for keeping each
/// page price-ascending like the real marketplace does.
pub struct MockSource {
    name: String,
    pages: HashMap<String, Vec<Vec<RawListing>>>,
    requests: Arc<Mutex<Vec<SearchRequest>>>,
    /// If set, every search returns this error.
    force_error: Arc<Mutex<Option<String>>>,
}

impl MockSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            pages: HashMap::new(),
            requests: Arc::new(Mutex::new(Vec::new())),
            force_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Serve `pages` for searches filtered on `bucket` (attribute id).
    pub fn with_bucket(mut self, bucket: &str, pages: Vec<Vec<RawListing>>) -> Self {
        self.pages.insert(bucket.to_string(), pages);
        self
    }

    /// Serve `pages` for searches without a bucket filter.
    pub fn with_unbucketed(self, pages: Vec<Vec<RawListing>>) -> Self {
        self.with_bucket(NO_BUCKET, pages)
    }

    /// Force all subsequent searches to fail.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ListingSource for MockSource {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(err) = self.force_error.lock().unwrap().as_ref() {
            return Err(anyhow!("{}", err));
        }

        let key = request.bucket.as_deref().unwrap_or(NO_BUCKET);
        let Some(pages) = self.pages.get(key) else {
            return Ok(SearchPage {
                total_pages: Some(0),
                record_count: Some(0),
                ..SearchPage::default()
            });
        };

        let listings = pages
            .get(request.page.saturating_sub(1) as usize)
            .cloned()
            .unwrap_or_default();
        Ok(SearchPage {
            listings,
            total_pages: Some(pages.len() as u32),
            record_count: Some(pages.iter().map(Vec::len).sum::<usize>() as u32),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// Listing builders
// ---------------------------------------------------------------------------

/// A listing tagged with its item name, as the marketplace returns them.
pub fn tagged(id: &str, item: &str, title: &str, price: Decimal) -> RawListing {
    RawListing {
        id: id.to_string(),
        title: title.to_string(),
        price,
        tags: vec![("Brainrot".to_string(), item.to_string())],
        seller: format!("seller-{id}"),
    }
}

/// A listing with no tags; only its title identifies the item.
pub fn untagged(id: &str, title: &str, price: Decimal) -> RawListing {
    RawListing {
        id: id.to_string(),
        title: title.to_string(),
        price,
        tags: Vec::new(),
        seller: format!("seller-{id}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_mock_serves_bucket_pages() {
        let source = MockSource::new("mock").with_bucket(
            "0-4",
            vec![
                vec![untagged("a", "Meowl 120M/s", dec!(3))],
                vec![untagged("b", "Meowl 160M/s", dec!(6))],
            ],
        );

        let req = SearchRequest::new(2, 50).with_bucket(Some("0-4"));
        let page = source.search(&req).await.unwrap();
        assert_eq!(page.listings.len(), 1);
        assert_eq!(page.listings[0].id, "b");
        assert_eq!(page.total_pages, Some(2));

        let past_end = source.search(&SearchRequest::new(3, 50).with_bucket(Some("0-4"))).await.unwrap();
        assert!(past_end.listings.is_empty());

        let other = source.search(&SearchRequest::new(1, 50).with_bucket(Some("0-5"))).await.unwrap();
        assert!(other.listings.is_empty());

        assert_eq!(source.request_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_forced_error() {
        let source = MockSource::new("mock").with_unbucketed(vec![vec![]]);
        source.set_error("Connection refused");
        assert!(source.search(&SearchRequest::new(1, 50)).await.is_err());

        source.clear_error();
        assert!(source.search(&SearchRequest::new(1, 50)).await.is_ok());
        assert_eq!(source.request_count(), 2);
    }
}

//! Core engine: scan pages, select a bracket, recommend a price.

pub mod bracket;
pub mod buckets;
pub mod cache;
pub mod controller;
pub mod scanner;

use async_trait::async_trait;

use crate::types::{PricingQuery, PricingResult, PricerError};

pub use bracket::{recommend_price, select_bracket, Bracket, PricingRules};
pub use buckets::{BucketTable, IncomeBucket};
pub use cache::CachedPriceFinder;
pub use controller::{ControllerSettings, PriceController};
pub use scanner::{ListingScanner, NameScope, ScanPage, ScanScope, ScannerSettings};

/// Anything that can answer a pricing query.
///
/// Implemented by [`PriceController`] and by decorators around it.
#[async_trait]
pub trait PriceFinder: Send + Sync {
    async fn find_price_bracket(&self, query: &PricingQuery) -> Result<PricingResult, PricerError>;
}

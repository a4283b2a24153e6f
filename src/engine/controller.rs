//! Pagination and bucket controller.
//!
//! Walks price-ascending pages of the target's income bucket until a page
//! yields an upper competitor. When the bucket runs out and the target sits
//! near its top edge, the next bucket is tried once. Everything a walk
//! needs lives on the stack of one call; the controller itself holds only
//! read-only handles.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::bracket::{median_price, recommend_price, select_bracket, PricingRules};
use super::buckets::{BucketTable, IncomeBucket};
use super::scanner::{ListingScanner, NameScope, ScanScope, ScannerSettings};
use super::PriceFinder;
use crate::catalog::CatalogMatcher;
use crate::config::AppConfig;
use crate::platforms::ListingSource;
use crate::types::{Listing, PricingQuery, PricingResult, PricerError};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Pages fetched per query, across all buckets.
    pub page_budget: u32,
    pub fetch_delay: Duration,
    /// Degraded pages in a row that end a bucket.
    pub max_consecutive_failures: u32,
    pub bucket_edge_fraction: f64,
    pub rules: PricingRules,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl ControllerSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            page_budget: cfg.pricer.page_budget,
            fetch_delay: Duration::from_millis(cfg.pricer.fetch_delay_ms),
            max_consecutive_failures: cfg.pricer.max_consecutive_failures.max(1),
            bucket_edge_fraction: cfg.pricer.bucket_edge_fraction,
            rules: PricingRules::from(&cfg.pricer),
        }
    }
}

/// How a single bucket walk ended.
enum BucketOutcome {
    Found(Box<PricingResult>),
    /// No upper in this bucket; more budget may remain.
    Exhausted,
    /// Page budget spent.
    OutOfBudget,
}

/// Per-call walk state.
struct Walk {
    pages_scanned: u32,
    name_scope: NameScope,
    fetched_any: bool,
    seen: HashSet<String>,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct PriceController {
    scanner: ListingScanner,
    buckets: BucketTable,
    settings: ControllerSettings,
}

impl PriceController {
    pub fn new(scanner: ListingScanner, buckets: BucketTable, settings: ControllerSettings) -> Self {
        Self {
            scanner,
            buckets,
            settings,
        }
    }

    /// Wire a controller from configuration.
    pub fn from_config(
        cfg: &AppConfig,
        source: Arc<dyn ListingSource>,
        matcher: Arc<CatalogMatcher>,
    ) -> Self {
        let scanner = ListingScanner::new(source, matcher, ScannerSettings::from_config(cfg));
        let buckets = cfg
            .buckets
            .clone()
            .map(BucketTable::new)
            .unwrap_or_default();
        Self::new(scanner, buckets, ControllerSettings::from_config(cfg))
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Price one query.
    ///
    /// Only a structurally invalid query is an error; a market with no
    /// competitor at or above the target comes back `exhausted`.
    pub async fn find_price_bracket(
        &self,
        query: &PricingQuery,
    ) -> Result<PricingResult, PricerError> {
        query.validate()?;

        info!(
            query = %query,
            source = %self.scanner.source_name(),
            budget = self.settings.page_budget,
            "Pricing query started"
        );

        let mut walk = Walk {
            pages_scanned: 0,
            name_scope: NameScope::Item,
            fetched_any: false,
            seen: HashSet::new(),
        };

        let mut index = self.buckets.index_for(query.target_income);
        let mut next_bucket_checked = false;
        let mut first_bucket = true;

        loop {
            let bucket = index.and_then(|i| self.buckets.get(i));

            match self.walk_bucket(query, bucket, first_bucket, &mut walk).await {
                BucketOutcome::Found(mut result) => {
                    result.next_bucket_checked = next_bucket_checked;
                    info!(
                        query = %query,
                        result = %result,
                        pages = walk.pages_scanned,
                        "Pricing query finished"
                    );
                    return Ok(*result);
                }
                BucketOutcome::OutOfBudget => {
                    warn!(
                        query = %query,
                        pages = walk.pages_scanned,
                        "Page budget exhausted without an upper competitor"
                    );
                    return Ok(PricingResult::market_above_target(
                        walk.pages_scanned,
                        bucket.cloned(),
                        next_bucket_checked,
                    ));
                }
                BucketOutcome::Exhausted => {}
            }

            let advance = match (index, bucket) {
                (Some(i), Some(b)) if !next_bucket_checked => b
                    .near_top_edge(query.target_income, self.settings.bucket_edge_fraction)
                    .then(|| i + 1)
                    .filter(|next| self.buckets.get(*next).is_some()),
                _ => None,
            };

            match advance {
                Some(next) => {
                    debug!(
                        query = %query,
                        from = ?bucket.map(|b| &b.label),
                        to = ?self.buckets.get(next).map(|b| &b.label),
                        "Target near bucket edge, scanning next bucket"
                    );
                    index = Some(next);
                    next_bucket_checked = true;
                    first_bucket = false;
                }
                None => {
                    info!(
                        query = %query,
                        pages = walk.pages_scanned,
                        "Market above target"
                    );
                    return Ok(PricingResult::market_above_target(
                        walk.pages_scanned,
                        bucket.cloned(),
                        next_bucket_checked,
                    ));
                }
            }
        }
    }

    async fn walk_bucket(
        &self,
        query: &PricingQuery,
        bucket: Option<&IncomeBucket>,
        first_bucket: bool,
        walk: &mut Walk,
    ) -> BucketOutcome {
        let mut page: u32 = 1;
        let mut failures: u32 = 0;

        loop {
            if walk.pages_scanned >= self.settings.page_budget {
                return BucketOutcome::OutOfBudget;
            }
            if walk.fetched_any && !self.settings.fetch_delay.is_zero() {
                tokio::time::sleep(self.settings.fetch_delay).await;
            }
            walk.fetched_any = true;

            let scope = ScanScope {
                page,
                bucket,
                name_scope: walk.name_scope,
            };
            let scan = self.scanner.scan(query, &scope).await;
            walk.pages_scanned += 1;

            if scan.degraded {
                failures += 1;
                if failures >= self.settings.max_consecutive_failures {
                    warn!(
                        query = %query,
                        page,
                        failures,
                        "Too many failed pages, giving up on bucket"
                    );
                    return BucketOutcome::Exhausted;
                }
                page += 1;
                continue;
            }
            failures = 0;

            if first_bucket && page == 1 && scan.raw_count == 0 {
                if let Some(wider) = walk.name_scope.widen() {
                    info!(
                        query = %query,
                        from = ?walk.name_scope,
                        to = ?wider,
                        "No results for name scope, widening search"
                    );
                    walk.name_scope = wider;
                    continue;
                }
            }

            let is_last = scan.is_last(page);
            let fresh: Vec<Listing> = scan
                .listings
                .into_iter()
                .filter(|l| walk.seen.insert(l.id.clone()))
                .collect();

            let bracket = select_bracket(&fresh, query.target_income);
            if bracket.upper.is_some() {
                let recommended_price = recommend_price(&bracket, &self.settings.rules);
                return BucketOutcome::Found(Box::new(PricingResult {
                    upper: bracket.upper,
                    lower: bracket.lower,
                    recommended_price,
                    exhausted: false,
                    next_competitor: bracket.next_competitor,
                    page_median_price: median_price(&fresh),
                    upper_page: Some(page),
                    bucket: bucket.cloned(),
                    next_bucket_checked: false,
                    pages_scanned: walk.pages_scanned,
                }));
            }

            if is_last {
                return BucketOutcome::Exhausted;
            }
            page += 1;
        }
    }
}

#[async_trait]
impl PriceFinder for PriceController {
    async fn find_price_bracket(&self, query: &PricingQuery) -> Result<PricingResult, PricerError> {
        PriceController::find_price_bracket(self, query).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! TTL cache decorator for price finders.
//!
//! Keeps the controller stateless: callers that want repeat queries served
//! from memory wrap it in [`CachedPriceFinder`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

use super::PriceFinder;
use crate::catalog::normalize_name;
use crate::types::{Modifier, PricingQuery, PricingResult, PricerError};

/// Default lifetime of a cached result.
pub const DEFAULT_TTL_SECS: i64 = 15 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    entry: String,
    rarity: Option<Modifier>,
    /// Target income in tenths of M/s.
    target_tenths: i64,
}

impl CacheKey {
    fn for_query(query: &PricingQuery) -> Self {
        Self {
            entry: normalize_name(&query.entry.name),
            rarity: query.rarity,
            target_tenths: (query.target_income * 10.0).round() as i64,
        }
    }
}

struct CachedResult {
    stored_at: DateTime<Utc>,
    result: PricingResult,
}

pub struct CachedPriceFinder<F> {
    inner: F,
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CachedResult>>,
}

impl<F: PriceFinder> CachedPriceFinder<F> {
    pub fn new(inner: F, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_default_ttl(inner: F) -> Self {
        Self::new(inner, Duration::seconds(DEFAULT_TTL_SECS))
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// Number of stored results, fresh or not.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Drop results older than the TTL.
    pub fn purge_expired(&self) {
        let now = Utc::now();
        let ttl = self.ttl;
        self.lock().retain(|_, cached| now - cached.stored_at < ttl);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, CachedResult>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, key: &CacheKey) -> Option<PricingResult> {
        let entries = self.lock();
        let cached = entries.get(key)?;
        (Utc::now() - cached.stored_at < self.ttl).then(|| cached.result.clone())
    }
}

#[async_trait]
impl<F: PriceFinder> PriceFinder for CachedPriceFinder<F> {
    async fn find_price_bracket(&self, query: &PricingQuery) -> Result<PricingResult, PricerError> {
        let key = CacheKey::for_query(query);
        if let Some(hit) = self.lookup(&key) {
            debug!(query = %query, "Price cache hit");
            return Ok(hit);
        }

        // Errors are returned as-is and never stored.
        let result = self.inner.find_price_bracket(query).await?;
        let now = Utc::now();
        let ttl = self.ttl;
        let mut entries = self.lock();
        entries.retain(|_, cached| now - cached.stored_at < ttl);
        entries.insert(
            key,
            CachedResult {
                stored_at: now,
                result: result.clone(),
            },
        );
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Marketplace income buckets.
//!
//! The marketplace exposes a coarse "M/s" attribute filter. Searches are
//! scoped to the bucket containing the target income; competitors just
//! above a bucket's top edge live in the next bucket.

use serde::{Deserialize, Serialize};

/// One coarse income-rate filter range (inclusive bounds, M/s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeBucket {
    pub label: String,
    /// Marketplace attribute id used in the search filter (e.g. "0-5").
    pub attribute_id: String,
    pub min: f64,
    pub max: f64,
}

impl IncomeBucket {
    pub fn new(label: &str, attribute_id: &str, min: f64, max: f64) -> Self {
        Self {
            label: label.to_string(),
            attribute_id: attribute_id.to_string(),
            min,
            max,
        }
    }

    /// Whether `income` sits in the top `fraction` of this bucket.
    pub fn near_top_edge(&self, income: f64, fraction: f64) -> bool {
        let width = self.max - self.min;
        if width <= 0.0 {
            return true;
        }
        income >= self.max - width * fraction.clamp(0.0, 1.0)
    }
}

/// Ordered bucket table, ascending by `min`.
#[derive(Debug, Clone)]
pub struct BucketTable {
    buckets: Vec<IncomeBucket>,
}

impl Default for BucketTable {
    fn default() -> Self {
        Self::new(vec![
            IncomeBucket::new("0-24 M/s", "0-1", 0.0, 24.0),
            IncomeBucket::new("25-49 M/s", "0-2", 25.0, 49.0),
            IncomeBucket::new("50-99 M/s", "0-3", 50.0, 99.0),
            IncomeBucket::new("100-249 M/s", "0-4", 100.0, 249.0),
            IncomeBucket::new("250-499 M/s", "0-5", 250.0, 499.0),
            IncomeBucket::new("500-749 M/s", "0-6", 500.0, 749.0),
            IncomeBucket::new("750-999 M/s", "0-7", 750.0, 999.0),
            IncomeBucket::new("1+ B/s", "0-8", 1000.0, 99999.0),
        ])
    }
}

impl BucketTable {
    pub fn new(mut buckets: Vec<IncomeBucket>) -> Self {
        buckets.sort_by(|a, b| a.min.partial_cmp(&b.min).unwrap_or(std::cmp::Ordering::Equal));
        Self { buckets }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Index of the bucket a target income falls into: the last bucket
    /// whose lower bound is <= income. Fractional targets between two
    /// integer-bounded buckets (e.g. 24.5) land in the lower one.
    pub fn index_for(&self, income: f64) -> Option<usize> {
        self.buckets.iter().rposition(|b| b.min <= income)
    }

    pub fn for_income(&self, income: f64) -> Option<&IncomeBucket> {
        self.index_for(income).map(|i| &self.buckets[i])
    }

    pub fn get(&self, index: usize) -> Option<&IncomeBucket> {
        self.buckets.get(index)
    }

    /// The next coarser bucket after `index`, if any.
    pub fn next(&self, index: usize) -> Option<&IncomeBucket> {
        self.buckets.get(index + 1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

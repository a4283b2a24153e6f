//! Bracket selection and price recommendation.
//!
//! Given one page of price-ascending listings, find the cheapest competitor
//! at or above the target income (upper) and the priciest weaker listing
//! that is still cheaper than it (lower), then undercut upper without
//! dropping below the gap to lower.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::PricerConfig;
use crate::types::Listing;

/// Undercut parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingRules {
    /// Minimum upper-lower gap for the wide undercut.
    pub min_gap: Decimal,
    pub wide_undercut: Decimal,
    pub narrow_undercut: Decimal,
    /// Recommendations never go below this.
    pub floor: Decimal,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            min_gap: dec!(1.00),
            wide_undercut: dec!(1.00),
            narrow_undercut: dec!(0.50),
            floor: dec!(0.01),
        }
    }
}

impl From<&PricerConfig> for PricingRules {
    fn from(cfg: &PricerConfig) -> Self {
        Self {
            min_gap: cfg.min_gap,
            wide_undercut: cfg.wide_undercut,
            narrow_undercut: cfg.narrow_undercut,
            floor: cfg.price_floor,
        }
    }
}

/// Competitors around the target on one page.
#[derive(Debug, Clone, Default)]
pub struct Bracket {
    pub upper: Option<Listing>,
    pub lower: Option<Listing>,
    pub next_competitor: Option<Listing>,
}

/// Select upper, lower and the next competitor from one price-ascending page.
///
/// Listings without a usable income (ranges, parse misses) are ignored.
pub fn select_bracket(listings: &[Listing], target: f64) -> Bracket {
    let with_income = || {
        listings
            .iter()
            .enumerate()
            .filter_map(|(i, l)| l.income().map(|inc| (i, l, inc)))
    };

    let Some((upper_idx, upper, _)) = with_income().find(|(_, _, inc)| *inc >= target) else {
        return Bracket::default();
    };

    // Highest price wins; ties go to the higher income, then the earlier listing.
    let mut lower: Option<(&Listing, f64)> = None;
    for (_, l, inc) in with_income() {
        if inc >= target || l.price >= upper.price {
            continue;
        }
        let better = match lower {
            None => true,
            Some((best, best_inc)) => l.price > best.price || (l.price == best.price && inc > best_inc),
        };
        if better {
            lower = Some((l, inc));
        }
    }

    let next_competitor = with_income()
        .find(|(i, l, inc)| *i > upper_idx && *inc >= target && l.price > upper.price)
        .map(|(_, l, _)| l.clone());

    Bracket {
        upper: Some(upper.clone()),
        lower: lower.map(|(l, _)| l.clone()),
        next_competitor,
    }
}

/// Recommended listing price for a bracket, `None` without an upper.
pub fn recommend_price(bracket: &Bracket, rules: &PricingRules) -> Option<Decimal> {
    let upper = bracket.upper.as_ref()?.price;

    let wide = bracket
        .lower
        .as_ref()
        .is_some_and(|lower| upper - lower.price >= rules.min_gap);

    let step = if wide {
        rules.wide_undercut
    } else {
        rules.narrow_undercut
    };

    Some((upper - step).max(rules.floor))
}

/// Median price of a page, `None` when empty.
pub fn median_price(listings: &[Listing]) -> Option<Decimal> {
    if listings.is_empty() {
        return None;
    }
    let mut prices: Vec<Decimal> = listings.iter().map(|l| l.price).collect();
    prices.sort();
    let mid = prices.len() / 2;
    if prices.len() % 2 == 0 {
        Some((prices[mid - 1] + prices[mid]) / dec!(2))
    } else {
        Some(prices[mid])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

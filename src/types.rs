//! Shared types for the UNDERCUT pricer.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that parser, catalog, platform,
//! and engine modules can depend on them without circular references.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::CatalogMatcher;
use crate::engine::buckets::IncomeBucket;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// A canonical item from the reference catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    /// Marketplace-side identifier, when the snapshot carries one.
    #[serde(default, rename = "id")]
    pub external_id: Option<String>,
    /// Reference price in USD (zero when unknown).
    #[serde(default, rename = "price")]
    pub reference_price: Decimal,
}

impl CatalogEntry {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            external_id: None,
            reference_price: Decimal::ZERO,
        }
    }
}

impl fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.external_id {
            Some(id) => write!(f, "{} ({id})", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

// ---------------------------------------------------------------------------
// Rarity modifier
// ---------------------------------------------------------------------------

/// Rarity modifier ("mutation") that moves an item into a different value tier.
///
/// "No modifier" is represented as `Option::<Modifier>::None` everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modifier {
    Gold,
    Diamond,
    Bloodrot,
    Candy,
    Lava,
    Galaxy,
    YinYang,
    Radioactive,
    Rainbow,
    Cursed,
}

impl Modifier {
    /// All known modifiers (useful for iteration).
    pub const ALL: &'static [Modifier] = &[
        Modifier::Gold,
        Modifier::Diamond,
        Modifier::Bloodrot,
        Modifier::Candy,
        Modifier::Lava,
        Modifier::Galaxy,
        Modifier::YinYang,
        Modifier::Radioactive,
        Modifier::Rainbow,
        Modifier::Cursed,
    ];

    /// Parse a seller-set tag value. `Ok(None)` means an explicit
    /// "no modifier" tag ("None", "Default", "Normal" or empty).
    pub fn from_tag(value: &str) -> Result<Option<Modifier>, PricerError> {
        let v = value.trim().to_lowercase();
        match v.as_str() {
            "" | "none" | "default" | "normal" => Ok(None),
            _ => v.parse::<Modifier>().map(Some),
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::Gold => write!(f, "Gold"),
            Modifier::Diamond => write!(f, "Diamond"),
            Modifier::Bloodrot => write!(f, "Bloodrot"),
            Modifier::Candy => write!(f, "Candy"),
            Modifier::Lava => write!(f, "Lava"),
            Modifier::Galaxy => write!(f, "Galaxy"),
            Modifier::YinYang => write!(f, "Yin-Yang"),
            Modifier::Radioactive => write!(f, "Radioactive"),
            Modifier::Rainbow => write!(f, "Rainbow"),
            Modifier::Cursed => write!(f, "Cursed"),
        }
    }
}

/// Attempt to parse a string into a Modifier (case-insensitive).
impl std::str::FromStr for Modifier {
    type Err = PricerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gold" => Ok(Modifier::Gold),
            "diamond" => Ok(Modifier::Diamond),
            "bloodrot" | "blood rot" => Ok(Modifier::Bloodrot),
            "candy" => Ok(Modifier::Candy),
            "lava" => Ok(Modifier::Lava),
            "galaxy" => Ok(Modifier::Galaxy),
            "yin-yang" | "yinyang" | "yin yang" => Ok(Modifier::YinYang),
            "radioactive" => Ok(Modifier::Radioactive),
            "rainbow" => Ok(Modifier::Rainbow),
            "cursed" => Ok(Modifier::Cursed),
            _ => Err(PricerError::UnknownModifier(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// One marketplace search result, as delivered by a `ListingSource`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawListing {
    pub id: String,
    pub title: String,
    /// Unit price in USD.
    pub price: Decimal,
    /// Category tag/value pairs, e.g. `("Brainrot", "Los Mobilis")`.
    #[serde(default)]
    pub tags: Vec<(String, String)>,
    #[serde(default)]
    pub seller: String,
}

impl RawListing {
    /// Value of the first tag with the given name (case-insensitive).
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Structured attributes derived from a listing title.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsedListing {
    /// Income rate in M/s; `None` when unparseable or a range.
    pub income_rate: Option<f64>,
    pub rarity: Option<Modifier>,
    pub is_range: bool,
    /// The seller's modifier tag disagrees with the title text.
    #[serde(default)]
    pub rarity_conflict: bool,
}

/// A raw listing together with its parsed attributes and the page it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub seller: String,
    pub price: Decimal,
    pub parsed: ParsedListing,
    /// 1-based page index within the bucket it was found in.
    pub page: u32,
}

impl Listing {
    pub fn from_raw(raw: RawListing, parsed: ParsedListing, page: u32) -> Self {
        Self {
            id: raw.id,
            title: raw.title,
            seller: raw.seller,
            price: raw.price,
            parsed,
            page,
        }
    }

    /// Income usable for bracketing: `None` for ranges and parse misses.
    pub fn income(&self) -> Option<f64> {
        if self.parsed.is_range {
            None
        } else {
            self.parsed.income_rate
        }
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let income = self
            .income()
            .map(|i| format!("{i} M/s"))
            .unwrap_or_else(|| "?".to_string());
        write!(f, "${} | {} | {}", self.price, income, self.title)
    }
}

// ---------------------------------------------------------------------------
// Query & result
// ---------------------------------------------------------------------------

/// What the caller wants priced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingQuery {
    pub entry: CatalogEntry,
    /// Target income rate in M/s.
    pub target_income: f64,
    /// Required rarity modifier; `None` requires an unmodified item.
    pub rarity: Option<Modifier>,
}

impl PricingQuery {
    pub fn new(entry: CatalogEntry, target_income: f64, rarity: Option<Modifier>) -> Self {
        Self {
            entry,
            target_income,
            rarity,
        }
    }

    /// Reject structurally invalid queries before any network activity.
    pub fn validate(&self) -> Result<(), PricerError> {
        if self.entry.name.trim().is_empty() {
            return Err(PricerError::InvalidQuery("missing catalog entry".into()));
        }
        if !self.target_income.is_finite() || self.target_income <= 0.0 {
            return Err(PricerError::InvalidQuery(format!(
                "target income must be a positive number, got {}",
                self.target_income
            )));
        }
        Ok(())
    }

    /// Build a query from free text: an item name resolved through the
    /// catalog matcher and an optional modifier name.
    pub fn from_text(
        matcher: &CatalogMatcher,
        item: &str,
        target_income: f64,
        modifier: Option<&str>,
    ) -> Result<Self, PricerError> {
        let entry = matcher
            .resolve(item)
            .cloned()
            .ok_or_else(|| PricerError::UnresolvedItem(item.to_string()))?;
        let rarity = match modifier {
            Some(m) => Modifier::from_tag(m)?,
            None => None,
        };
        let query = Self::new(entry, target_income, rarity);
        query.validate()?;
        Ok(query)
    }
}

impl fmt::Display for PricingQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rarity = self
            .rarity
            .map(|m| m.to_string())
            .unwrap_or_else(|| "Default".to_string());
        write!(f, "{} @ {} M/s [{}]", self.entry.name, self.target_income, rarity)
    }
}

/// Outcome of a bracket search. Every failure mode is an absent field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingResult {
    /// Cheapest listing with income >= target.
    pub upper: Option<Listing>,
    /// Highest-priced listing on upper's page with lower income and price.
    pub lower: Option<Listing>,
    pub recommended_price: Option<Decimal>,
    /// No upper was found within the page budget.
    pub exhausted: bool,
    /// Next stronger listing after upper on the same page.
    pub next_competitor: Option<Listing>,
    /// Median price of the listings on upper's page.
    pub page_median_price: Option<Decimal>,
    pub upper_page: Option<u32>,
    /// Bucket the upper was found in (or the last bucket scanned).
    pub bucket: Option<IncomeBucket>,
    pub next_bucket_checked: bool,
    pub pages_scanned: u32,
}

impl PricingResult {
    pub fn market_above_target(
        pages_scanned: u32,
        bucket: Option<IncomeBucket>,
        next_bucket_checked: bool,
    ) -> Self {
        Self {
            exhausted: true,
            bucket,
            next_bucket_checked,
            pages_scanned,
            ..Self::default()
        }
    }
}

impl fmt::Display for PricingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.upper, self.recommended_price) {
            (Some(upper), Some(price)) => {
                write!(f, "recommend ${price} (upper ${}", upper.price)?;
                if let Some(lower) = &self.lower {
                    write!(f, ", lower ${}", lower.price)?;
                }
                write!(f, ", {} pages)", self.pages_scanned)
            }
            _ => write!(f, "market above target ({} pages scanned)", self.pages_scanned),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for UNDERCUT.
#[derive(Debug, thiserror::Error)]
pub enum PricerError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Unknown rarity modifier: {0}")]
    UnknownModifier(String),

    #[error("No catalog entry matches: {0}")]
    UnresolvedItem(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_modifier_from_str() {
        assert_eq!("gold".parse::<Modifier>().unwrap(), Modifier::Gold);
        assert_eq!("Yin-Yang".parse::<Modifier>().unwrap(), Modifier::YinYang);
        assert_eq!("YINYANG".parse::<Modifier>().unwrap(), Modifier::YinYang);
        assert!("shiny".parse::<Modifier>().is_err());
    }

    #[test]
    fn test_modifier_from_tag_none_variants() {
        assert_eq!(Modifier::from_tag("None").unwrap(), None);
        assert_eq!(Modifier::from_tag("default").unwrap(), None);
        assert_eq!(Modifier::from_tag("  ").unwrap(), None);
        assert_eq!(Modifier::from_tag("Lava").unwrap(), Some(Modifier::Lava));
    }

    #[test]
    fn test_modifier_display_roundtrip() {
        for m in Modifier::ALL {
            assert_eq!(m.to_string().parse::<Modifier>().unwrap(), *m);
        }
    }

    #[test]
    fn test_raw_listing_tag_lookup() {
        let raw = RawListing {
            id: "1".into(),
            title: "t".into(),
            price: dec!(1),
            tags: vec![("Brainrot".into(), "Los 25".into())],
            seller: "s".into(),
        };
        assert_eq!(raw.tag("brainrot"), Some("Los 25"));
        assert_eq!(raw.tag("Mutations"), None);
    }

    #[test]
    fn test_listing_income_hidden_for_ranges() {
        let raw = RawListing {
            id: "1".into(),
            title: "t".into(),
            price: dec!(1),
            tags: vec![],
            seller: String::new(),
        };
        let parsed = ParsedListing {
            income_rate: Some(100.0),
            is_range: true,
            ..Default::default()
        };
        assert_eq!(Listing::from_raw(raw, parsed, 1).income(), None);
    }

    #[test]
    fn test_query_validation() {
        let ok = PricingQuery::new(CatalogEntry::new("Los 25"), 85.0, None);
        assert!(ok.validate().is_ok());

        let no_name = PricingQuery::new(CatalogEntry::new("  "), 85.0, None);
        assert!(matches!(no_name.validate(), Err(PricerError::InvalidQuery(_))));

        let nan = PricingQuery::new(CatalogEntry::new("Los 25"), f64::NAN, None);
        assert!(nan.validate().is_err());

        let negative = PricingQuery::new(CatalogEntry::new("Los 25"), -1.0, None);
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_query_from_text() {
        use crate::catalog::Catalog;
        use std::sync::Arc;

        let catalog = Catalog::new("t", vec![CatalogEntry::new("Ginger Girat")]);
        let matcher = CatalogMatcher::with_defaults(Arc::new(catalog));

        let q = PricingQuery::from_text(&matcher, "ginger gerat", 40.0, Some("rainbow")).unwrap();
        assert_eq!(q.entry.name, "Ginger Girat");
        assert_eq!(q.rarity, Some(Modifier::Rainbow));

        let q = PricingQuery::from_text(&matcher, "Ginger Girat", 40.0, Some("None")).unwrap();
        assert_eq!(q.rarity, None);

        assert!(matches!(
            PricingQuery::from_text(&matcher, "unknown thing", 40.0, None),
            Err(PricerError::UnresolvedItem(_))
        ));
        assert!(matches!(
            PricingQuery::from_text(&matcher, "ginger girat", 40.0, Some("shiny")),
            Err(PricerError::UnknownModifier(_))
        ));
    }

    #[test]
    fn test_catalog_entry_deserialize_defaults() {
        let entry: CatalogEntry = serde_json::from_str(r#"{"name":"Meowl"}"#).unwrap();
        assert_eq!(entry.name, "Meowl");
        assert!(entry.external_id.is_none());
        assert_eq!(entry.reference_price, Decimal::ZERO);

        let entry: CatalogEntry =
            serde_json::from_str(r#"{"name":"Meowl","id":"m-1","price":12.5}"#).unwrap();
        assert_eq!(entry.external_id.as_deref(), Some("m-1"));
        assert_eq!(entry.reference_price, dec!(12.5));
    }
}

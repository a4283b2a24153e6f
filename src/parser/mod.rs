//! Listing title parser.
//!
//! Turns a free-text marketplace title into a [`ParsedListing`]: income rate
//! in M/s, rarity modifier and a range flag. Parsing is pure and
//! deterministic; anything ambiguous yields `income_rate: None` rather
//! than a guess.
//!
//! Pipeline: normalize -> strip known item name -> neutralize decoys ->
//! range/lootbox check -> unit table.

pub mod normalize;
pub mod rarity;
pub mod units;

use regex::Regex;

use crate::types::{Modifier, ParsedListing, RawListing};

pub use normalize::normalize_title;

/// Tag key carrying the seller-set modifier on marketplace listings.
pub const DEFAULT_MODIFIER_TAG: &str = "Mutations";

/// Parser configured for one catalog item.
///
/// Knowing the item name lets the parser remove it before looking for
/// numbers, so names containing digits ("Los 25") are not read as income.
#[derive(Debug, Clone)]
pub struct TitleParser {
    name_pattern: Option<Regex>,
    modifier_tag_key: String,
}

impl Default for TitleParser {
    fn default() -> Self {
        Self {
            name_pattern: None,
            modifier_tag_key: DEFAULT_MODIFIER_TAG.to_string(),
        }
    }
}

impl TitleParser {
    pub fn for_item(name: &str, modifier_tag_key: &str) -> Self {
        Self {
            name_pattern: normalize::name_pattern(name),
            modifier_tag_key: modifier_tag_key.to_string(),
        }
    }

    /// Parse a bare title with no structured tag.
    pub fn parse(&self, title: &str) -> ParsedListing {
        self.parse_with_tag(title, None)
    }

    /// Parse a marketplace listing, using its modifier tag when present.
    /// An unrecognized tag value is treated as no tag.
    pub fn parse_listing(&self, raw: &RawListing) -> ParsedListing {
        let tag = raw
            .tag(&self.modifier_tag_key)
            .and_then(|v| Modifier::from_tag(v).ok().flatten());
        self.parse_with_tag(&raw.title, tag)
    }

    fn parse_with_tag(&self, title: &str, tag: Option<Modifier>) -> ParsedListing {
        let pattern = self.name_pattern.as_ref();

        // Rarity runs on the lowercased raw title so symbols survive.
        let rarity_text = normalize::strip_name(&title.to_lowercase(), pattern);
        let (rarity, rarity_conflict) = rarity::resolve_rarity(tag, &rarity_text);

        let text = normalize::strip_name(&normalize::normalize_title(title), pattern);
        let text = normalize::neutralize_decoys(&text);

        if units::is_range(&text) || units::is_lootbox(&text) {
            return ParsedListing {
                income_rate: None,
                rarity,
                is_range: true,
                rarity_conflict,
            };
        }

        ParsedListing {
            income_rate: units::parse_income(&text).map(|m| m.value),
            rarity,
            is_range: false,
            rarity_conflict,
        }
    }
}

/// Parse a title without item context.
pub fn parse_title(title: &str) -> ParsedListing {
    TitleParser::default().parse(title)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

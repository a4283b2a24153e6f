//! Rarity modifier detection.
//!
//! The seller-set tag is the starting point but the title is authoritative:
//! a tag the title contradicts is overridden and flagged.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::Modifier;

static MODIFIER_WORDS: LazyLock<Vec<(Modifier, Regex)>> = LazyLock::new(|| {
    [
        (Modifier::Gold, r"\bgold(?:en)?\b"),
        (Modifier::Diamond, r"\bdiamond\b"),
        (Modifier::Bloodrot, r"\bblood\s?rot\b"),
        (Modifier::Candy, r"\bcandy\b"),
        (Modifier::Lava, r"\blava\b"),
        (Modifier::Galaxy, r"\bgalaxy\b"),
        (Modifier::YinYang, r"\byin\s*[-_]?\s*yang\b"),
        (Modifier::Radioactive, r"\bradioactive\b"),
        (Modifier::Rainbow, r"\brainbow\b"),
        (Modifier::Cursed, r"\bcursed\b"),
    ]
    .into_iter()
    .map(|(m, p)| (m, Regex::new(p).expect("modifier regex")))
    .collect()
});

/// Stylized symbols sellers use in place of a modifier name.
const MODIFIER_SYMBOLS: &[(char, Modifier)] = &[
    ('☯', Modifier::YinYang),
    ('☢', Modifier::Radioactive),
    ('🩸', Modifier::Bloodrot),
];

/// Modifiers named in `text`, ordered by first appearance, without repeats.
/// `text` should be the lowercased raw title so symbols survive.
pub fn detect_modifiers(text: &str) -> Vec<Modifier> {
    let mut found: Vec<(usize, Modifier)> = Vec::new();

    for (modifier, re) in MODIFIER_WORDS.iter() {
        if let Some(m) = re.find(text) {
            found.push((m.start(), *modifier));
        }
    }
    for (symbol, modifier) in MODIFIER_SYMBOLS {
        if let Some(pos) = text.find(*symbol) {
            found.push((pos, *modifier));
        }
    }

    found.sort_by_key(|(pos, _)| *pos);
    let mut out: Vec<Modifier> = Vec::with_capacity(found.len());
    for (_, m) in found {
        if !out.contains(&m) {
            out.push(m);
        }
    }
    out
}

/// Resolve the effective modifier from a parsed tag and the title text.
///
/// Returns the modifier and whether the tag was overridden by the title.
pub fn resolve_rarity(tag: Option<Modifier>, title_text: &str) -> (Option<Modifier>, bool) {
    let named = detect_modifiers(title_text);
    match (tag, named.first()) {
        (tag, None) => (tag, false),
        (Some(t), Some(_)) if named.contains(&t) => (Some(t), false),
        (Some(_), Some(first)) => (Some(*first), true),
        (None, Some(first)) => (Some(*first), false),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

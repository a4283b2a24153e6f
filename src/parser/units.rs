//! Income-rate unit table and range / lootbox detection.
//!
//! Rules are tried in order; the first rule producing an in-window value
//! wins. B/s rules run before M/s rules so "1.5B/s" is never read as 1.5.

use regex::Regex;
use std::sync::LazyLock;

/// One unit pattern. Group 1 captures the numeric part.
pub struct UnitRule {
    pub name: &'static str,
    pub pattern: Regex,
    pub scale: f64,
    /// Accepted window for the scaled value (M/s, inclusive).
    pub min: f64,
    pub max: f64,
}

/// Result of a successful unit match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncomeMatch {
    pub value: f64,
    pub rule: &'static str,
}

const NUMBER: &str = r"([0-9]+(?:[.,][0-9]+)?)";

fn rule(name: &'static str, suffix: &str, scale: f64, min: f64, max: f64) -> UnitRule {
    let pattern = Regex::new(&format!(r"{NUMBER}\s*{suffix}")).expect("unit rule regex");
    UnitRule {
        name,
        pattern,
        scale,
        min,
        max,
    }
}

pub static UNIT_RULES: LazyLock<Vec<UnitRule>> = LazyLock::new(|| {
    vec![
        rule(
            "billion_per_second",
            r"(?:b|bil|billion)\s*/\s*s(?:ec)?\b",
            1000.0,
            1000.0,
            99_999.0,
        ),
        rule("billion_word", r"(?:bil|billion)\b", 1000.0, 1000.0, 99_999.0),
        rule(
            "million_per_second",
            r"(?:m|mil|million)\s*/\s*s(?:ec)?\b",
            1.0,
            1.0,
            9_999.0,
        ),
        rule("million_mps", r"m(?:ps|s)\b", 1.0, 1.0, 9_999.0),
        rule("million_bare", r"(?:m|mil|million)\b", 1.0, 1.0, 9_999.0),
    ]
});

static RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b[0-9]+(?:[.,][0-9]+)?\s*(?:million|billion|mil|bil|[mbk])?(?:\s*/\s*s(?:ec)?)?(?:\s*[-~]+\s*|\s+to\s+)[0-9]+(?:[.,][0-9]+)?\s*(?:million|billion|mil|bil|[mbk])(?:\s*/\s*s(?:ec)?)?\b",
    )
    .expect("range regex")
});

static LOOTBOX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"spin\s*(?:the\s*)?wheel|random\s*(?:m/s|brainrot|pet)|mystery\s*(?:box|pet|brainrot)|lucky\s*(?:spin|wheel|draw)",
    )
    .expect("lootbox regex")
});

/// Characters that mark the following number as something other than an
/// income rate (a price, a quantity, an id).
const REJECTING_PREFIXES: [char; 3] = ['$', 'x', '#'];

/// Whether the text advertises a span of income values ("88M-220M/s").
pub fn is_range(text: &str) -> bool {
    RANGE.is_match(text)
}

/// Whether the text describes a randomized offer with no fixed income.
pub fn is_lootbox(text: &str) -> bool {
    LOOTBOX.is_match(text)
}

/// Extract the income rate from normalized, decoy-free text.
pub fn parse_income(text: &str) -> Option<IncomeMatch> {
    UNIT_RULES.iter().find_map(|rule| first_in_window(rule, text))
}

fn first_in_window(rule: &UnitRule, text: &str) -> Option<IncomeMatch> {
    rule.pattern.captures_iter(text).find_map(|caps| {
        let number = caps.get(1)?;
        if preceded_by_rejecting_prefix(text, number.start()) {
            return None;
        }
        let raw: f64 = number.as_str().replace(',', ".").parse().ok()?;
        let value = raw * rule.scale;
        (value >= rule.min && value <= rule.max).then_some(IncomeMatch {
            value,
            rule: rule.name,
        })
    })
}

fn preceded_by_rejecting_prefix(text: &str, start: usize) -> bool {
    let before = text[..start].trim_end_matches(' ');
    match before.chars().next_back() {
        // A quantity marker only when standalone: "x3", "x 3", not "max 3".
        Some('x') => before[..before.len() - 1]
            .chars()
            .next_back()
            .map_or(true, char::is_whitespace),
        Some(c) if REJECTING_PREFIXES.contains(&c) => true,
        // Tail of a longer dotted token such as a version or price "1.2.3".
        Some(c) if c == '.' || c == ',' => before[..before.len() - 1]
            .ends_with(|p: char| p.is_ascii_digit()),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Title normalization and decoy neutralization.

use regex::Regex;
use std::sync::LazyLock;

/// Punctuation that carries meaning for the income/range patterns.
/// Everything else that is not alphanumeric or whitespace becomes a space.
const KEPT_PUNCTUATION: &str = ".,/$-~:[]()+#&'%";

static KEYCAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9#*]\x{FE0F}?\x{20E3}").expect("keycap regex"));

static UNIT_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"unit\s*price\s*:?\s*\$?\s*[0-9]+(?:[.,][0-9]+)?(?:\s*[mb]\b)?")
        .expect("unit price regex")
});

// "- x2 mutations", "x3 mut", "2x mutations", "2 mutations"
static MUTATION_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:-\s*)?(?:\bx\s*[0-9]+|\b[0-9]+\s*x?)\s*(?:mutations?|muts?)\b")
        .expect("mutation count regex")
});

// Quantity tags: "x2", "- x3", "5x"
static QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:-\s*)?(?:\bx\s?[0-9]+\b|\b[0-9]+\s?x\b)").expect("quantity regex")
});

/// Lowercase, unify dashes, drop emoji and decorative separators, and
/// collapse whitespace.
pub fn normalize_title(title: &str) -> String {
    let lower = title.to_lowercase();
    let without_keycaps = KEYCAP.replace_all(&lower, " ");

    let mapped: String = without_keycaps
        .chars()
        .map(|c| match c {
            '–' | '—' | '−' | '‐' => '-',
            '×' => 'x',
            c if c.is_alphanumeric() || c.is_whitespace() => c,
            c if KEPT_PUNCTUATION.contains(c) => c,
            _ => ' ',
        })
        .collect();

    collapse_whitespace(&mapped)
}

/// Remove price annotations and quantity tags so their numbers cannot be
/// read as income.
pub fn neutralize_decoys(normalized: &str) -> String {
    let text = UNIT_PRICE.replace_all(normalized, " ");
    let text = MUTATION_COUNT.replace_all(&text, " ");
    let text = QUANTITY.replace_all(&text, " ");
    collapse_whitespace(&text)
}

/// Word-bounded pattern for a known item name inside a normalized title.
/// Returns `None` for names that normalize to nothing.
pub fn name_pattern(name: &str) -> Option<Regex> {
    let normalized = normalize_title(name);
    if normalized.is_empty() {
        return None;
    }
    Regex::new(&format!(r"\b{}\b", regex::escape(&normalized))).ok()
}

/// Remove every occurrence of the item name from `text`.
pub fn strip_name(text: &str, pattern: Option<&Regex>) -> String {
    match pattern {
        Some(re) => collapse_whitespace(&re.replace_all(text, " ")),
        None => text.to_string(),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_emoji_and_separators() {
        assert_eq!(
            normalize_title("⭐🔥 Los Planitos | 300M/s • FAST ✅"),
            "los planitos 300m/s fast"
        );
    }

    #[test]
    fn test_normalize_unifies_dashes() {
        assert_eq!(normalize_title("88M – 220M/s"), "88m - 220m/s");
        assert_eq!(normalize_title("×2"), "x2");
    }

    #[test]
    fn test_normalize_drops_keycaps() {
        assert_eq!(normalize_title("1\u{FE0F}\u{20E3} Meowl 50M/s"), "meowl 50m/s");
    }

    #[test]
    fn test_neutralize_mutation_counts() {
        assert_eq!(
            neutralize_decoys("swaggy bros 740m - x2 mutations"),
            "swaggy bros 740m"
        );
        assert_eq!(neutralize_decoys("3x mutations 150m/s"), "150m/s");
        assert_eq!(neutralize_decoys("2 mutations 150m/s"), "150m/s");
    }

    #[test]
    fn test_neutralize_unit_price() {
        assert_eq!(neutralize_decoys("unit price: $5m los 25"), "los 25");
        assert_eq!(neutralize_decoys("unit price $1.50 meowl"), "meowl");
    }

    #[test]
    fn test_neutralize_quantity_tags() {
        assert_eq!(neutralize_decoys("meowl x3 45m/s"), "meowl 45m/s");
        assert_eq!(neutralize_decoys("5x meowl"), "meowl");
    }

    #[test]
    fn test_strip_name_word_bounded() {
        let re = name_pattern("Los 25");
        assert_eq!(strip_name("los 25 - 85m/s", re.as_ref()), "- 85m/s");
        // "los 250m/s" does not contain the word-bounded name "los 25"
        assert_eq!(strip_name("los 250m/s", re.as_ref()), "los 250m/s");
    }

    #[test]
    fn test_strip_name_without_pattern() {
        assert_eq!(strip_name("abc", None), "abc");
        assert!(name_pattern("⭐").is_none());
    }
}

//! Cheap typo-tolerant string comparison.

use std::collections::HashSet;

/// Minimum fuzzy-key length for a key collision to count as a match.
const MIN_KEY_LEN: usize = 4;

/// Lowercase, drop everything but ASCII letters and digits, then drop
/// vowels after the first character. Keys of two characters or fewer are
/// returned whole.
pub fn fuzzy_key(s: &str) -> String {
    let lower: String = s
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();
    if lower.len() <= 2 {
        return lower;
    }

    let mut chars = lower.chars();
    let mut key = String::with_capacity(lower.len());
    if let Some(first) = chars.next() {
        key.push(first);
    }
    key.extend(chars.filter(|c| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')));
    key
}

/// Similarity in [0, 1].
///
/// 1.0 for equal strings, 0.9 for a shared fuzzy key of length >= 4, 0.8
/// for substring containment, otherwise character-set Jaccard plus a
/// shared-prefix bonus.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a == b {
        return 1.0;
    }

    let key_a = fuzzy_key(&a);
    if key_a.len() >= MIN_KEY_LEN && key_a == fuzzy_key(&b) {
        return 0.9;
    }

    if a.contains(&b) || b.contains(&a) {
        return 0.8;
    }

    let set_a: HashSet<char> = a.chars().collect();
    let set_b: HashSet<char> = b.chars().collect();
    let intersection = set_a.intersection(&set_b).count() as f64;
    let union = set_a.union(&set_b).count() as f64;
    let jaccard = if union > 0.0 { intersection / union } else { 0.0 };

    let prefix_len = a
        .chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .count();
    let prefix_bonus = match prefix_len {
        n if n >= 3 => 0.2,
        2 => 0.1,
        _ => 0.0,
    };

    (jaccard + prefix_bonus).min(1.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

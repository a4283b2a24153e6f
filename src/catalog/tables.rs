//! Alias and deny-list tables used by the matcher.

use regex::Regex;
use std::collections::{HashMap, HashSet};

use super::normalize_name;
use crate::config::DenyListConfig;
use crate::types::PricerError;

// ---------------------------------------------------------------------------
// Aliases
// ---------------------------------------------------------------------------

/// Known misspellings and seller variants mapped to canonical names.
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("ginger gerat", "ginger girat"),
    ("giandante mozzarello", "giandante mozzarella"),
    ("la taco 2 combinasion", "la taco combinasion 2"),
    ("cagatto bombastico", "cagatto"),
    ("boatito auratito", "boatito"),
    ("cappuccino assassino golden", "cappuccino assassino"),
    ("cappuccino assasino gold", "cappuccino assassino"),
    ("cappuccino assassino gold", "cappuccino assassino"),
    ("reinito slegito", "reinitio slegito"),
    ("obunga", "obunga classic"),
    ("la ginger", "la ginger sekolah"),
];

/// Variant -> canonical mapping, queried in both directions.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    forward: HashMap<String, String>,
    reverse: HashMap<String, Vec<String>>,
}

impl AliasTable {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut table = Self::default();
        for (variant, canonical) in pairs {
            table.insert(variant.as_ref(), canonical.as_ref());
        }
        table
    }

    /// The built-in alias set.
    pub fn builtin() -> Self {
        Self::new(DEFAULT_ALIASES.iter().copied())
    }

    pub fn insert(&mut self, variant: &str, canonical: &str) {
        let variant = normalize_name(variant);
        let canonical = normalize_name(canonical);
        if variant.is_empty() || canonical.is_empty() || variant == canonical {
            return;
        }
        self.reverse
            .entry(canonical.clone())
            .or_default()
            .push(variant.clone());
        self.forward.insert(variant, canonical);
    }

    /// Names linked to `normalized` by an alias: its canonical form when it
    /// is a variant, then any variants when it is itself canonical.
    pub fn counterparts(&self, normalized: &str) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        if let Some(canonical) = self.forward.get(normalized) {
            out.push(canonical);
        }
        if let Some(variants) = self.reverse.get(normalized) {
            out.extend(variants.iter().map(String::as_str));
        }
        out
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Deny list
// ---------------------------------------------------------------------------

/// Common title words known to collide with catalog fuzzy keys.
pub const DEFAULT_DENY_WORDS: &[&str] = &[
    "trait", "traits", "trade", "trading", "trail", "trails", "cheap", "cheapest", "fast",
    "fastest", "delivery", "instant", "quick", "asap", "rare", "rarest", "exclusive", "limited",
    "edition", "secret", "brainrot", "steal", "roblox", "account", "mutation", "mutations",
    "mutated", "second", "seconds", "minute", "guaranteed", "discount", "bundle", "package",
    "entrega", "rapida", "christmas", "santa", "holiday", "event", "spider", "fire", "speed",
];

/// Token shapes that are never item names: bare numbers and income figures.
pub const DEFAULT_DENY_PATTERNS: &[&str] = &[
    r"^[0-9]+$",
    r"^[0-9]+(?:[.,][0-9]+)?\s*[mbk]?(?:\s*/?\s*s)?$",
];

/// Decoy tokens the fuzzy stage must never resolve.
///
/// Produced offline by the `collision_audit` tool and versioned so a
/// deployment can tell which analysis it runs with.
#[derive(Debug, Clone)]
pub struct DenyList {
    pub version: String,
    words: HashSet<String>,
    patterns: Vec<Regex>,
}

impl Default for DenyList {
    fn default() -> Self {
        Self {
            version: "builtin".to_string(),
            words: DEFAULT_DENY_WORDS.iter().map(|w| w.to_string()).collect(),
            patterns: DEFAULT_DENY_PATTERNS
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect(),
        }
    }
}

impl DenyList {
    pub fn empty() -> Self {
        Self {
            version: "empty".to_string(),
            words: HashSet::new(),
            patterns: Vec::new(),
        }
    }

    pub fn from_config(cfg: &DenyListConfig) -> Result<Self, PricerError> {
        let mut list = if cfg.include_builtin {
            Self::default()
        } else {
            Self::empty()
        };
        list.version = cfg.version.clone();
        list.words
            .extend(cfg.words.iter().map(|w| normalize_name(w)).filter(|w| !w.is_empty()));
        for p in &cfg.patterns {
            let re = Regex::new(p)
                .map_err(|e| PricerError::Config(format!("bad deny-list pattern {p:?}: {e}")))?;
            list.patterns.push(re);
        }
        Ok(list)
    }

    /// Whether a normalized token is a known decoy.
    pub fn denies(&self, normalized: &str) -> bool {
        self.words.contains(normalized) || self.patterns.iter().any(|re| re.is_match(normalized))
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_both_directions() {
        let table = AliasTable::builtin();
        assert_eq!(table.counterparts("ginger gerat"), vec!["ginger girat"]);
        assert_eq!(table.counterparts("ginger girat"), vec!["ginger gerat"]);
        assert!(table.counterparts("meowl").is_empty());
    }

    #[test]
    fn test_alias_keys_normalized() {
        let table = AliasTable::new([("Obunga!", "Obunga Classic")]);
        assert_eq!(table.counterparts("obunga"), vec!["obunga classic"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_self_alias_ignored() {
        let table = AliasTable::new([("meowl", "Meowl")]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_default_deny_list() {
        let deny = DenyList::default();
        assert!(deny.denies("trait"));
        assert!(deny.denies("santa"));
        assert!(deny.denies("150"));
        assert!(deny.denies("150m/s"));
        assert!(!deny.denies("meowl"));
    }

    #[test]
    fn test_from_config_extends_builtin() {
        let cfg = DenyListConfig {
            version: "2026-10-01".into(),
            include_builtin: true,
            words: vec!["Tralala".into()],
            patterns: vec![r"^x[0-9]+$".into()],
        };
        let deny = DenyList::from_config(&cfg).unwrap();
        assert_eq!(deny.version, "2026-10-01");
        assert!(deny.denies("tralala"));
        assert!(deny.denies("x3"));
        assert!(deny.denies("trait"));
    }

    #[test]
    fn test_from_config_rejects_bad_pattern() {
        let cfg = DenyListConfig {
            version: "v".into(),
            include_builtin: false,
            words: vec![],
            patterns: vec!["(".into()],
        };
        assert!(matches!(
            DenyList::from_config(&cfg),
            Err(PricerError::Config(_))
        ));
    }
}

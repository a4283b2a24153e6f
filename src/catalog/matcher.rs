//! Resolve free text to a catalog entry.
//!
//! Resolution order: exact -> alias -> deny-list -> fuzzy. The fuzzy stage
//! fails closed: a decoy token or an ambiguous score returns `None`.

use std::sync::Arc;
use tracing::{debug, trace};

use super::fuzzy::similarity;
use super::tables::{AliasTable, DenyList};
use super::{normalize_name, Catalog};
use crate::types::CatalogEntry;

/// Default acceptance threshold for fuzzy matches.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.88;

/// Longest title window tried by [`CatalogMatcher::identify`].
const MAX_WINDOW_WORDS: usize = 6;

pub struct CatalogMatcher {
    catalog: Arc<Catalog>,
    aliases: AliasTable,
    deny: DenyList,
    threshold: f64,
}

impl CatalogMatcher {
    pub fn new(catalog: Arc<Catalog>, aliases: AliasTable, deny: DenyList, threshold: f64) -> Self {
        Self {
            catalog,
            aliases,
            deny,
            threshold,
        }
    }

    /// Matcher with the built-in alias and deny tables.
    pub fn with_defaults(catalog: Arc<Catalog>) -> Self {
        Self::new(
            catalog,
            AliasTable::builtin(),
            DenyList::default(),
            DEFAULT_FUZZY_THRESHOLD,
        )
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn deny_list_version(&self) -> &str {
        &self.deny.version
    }

    /// Resolve a name-like string to a catalog entry.
    pub fn resolve(&self, text: &str) -> Option<&CatalogEntry> {
        let normalized = normalize_name(text);
        if normalized.is_empty() {
            return None;
        }

        // An exact entry is never remapped.
        if let Some(entry) = self.catalog.get_normalized(&normalized) {
            return Some(entry);
        }

        for counterpart in self.aliases.counterparts(&normalized) {
            if let Some(entry) = self.catalog.get_normalized(counterpart) {
                trace!(text = %normalized, entry = %entry.name, "Alias match");
                return Some(entry);
            }
        }

        if self.deny.denies(&normalized) {
            trace!(text = %normalized, "Deny-listed token");
            return None;
        }

        self.fuzzy(&normalized)
    }

    fn fuzzy(&self, normalized: &str) -> Option<&CatalogEntry> {
        let mut candidates = self
            .catalog
            .iter_normalized()
            .filter(|(name, _)| similarity(normalized, name) >= self.threshold)
            .map(|(_, entry)| entry);

        let first = candidates.next()?;
        if let Some(second) = candidates.next() {
            debug!(
                text = %normalized,
                first = %first.name,
                second = %second.name,
                "Ambiguous fuzzy match rejected"
            );
            return None;
        }
        debug!(text = %normalized, entry = %first.name, "Fuzzy match");
        Some(first)
    }

    /// Whether a listing title refers to `entry`.
    ///
    /// Word-bounded containment of the name or one of its aliases first,
    /// then windows of the title around the name's word count resolved
    /// through [`resolve`](Self::resolve).
    pub fn mentions(&self, title: &str, entry: &CatalogEntry) -> bool {
        let title_norm = normalize_name(title);
        let entry_norm = normalize_name(&entry.name);
        if entry_norm.is_empty() || title_norm.is_empty() {
            return false;
        }

        let padded = format!(" {title_norm} ");
        if padded.contains(&format!(" {entry_norm} ")) {
            return true;
        }
        if self
            .aliases
            .counterparts(&entry_norm)
            .iter()
            .any(|alias| padded.contains(&format!(" {alias} ")))
        {
            return true;
        }

        let words: Vec<&str> = title_norm.split(' ').collect();
        let name_len = entry_norm.split(' ').count();
        let sizes = name_len.saturating_sub(1).max(1)..=name_len + 1;

        sizes.into_iter().any(|size| {
            windows(&words, size).any(|window| {
                self.resolve(&window)
                    .is_some_and(|found| normalize_name(&found.name) == entry_norm)
            })
        })
    }

    /// Find the catalog entry a title is about, preferring longer spans.
    pub fn identify(&self, title: &str) -> Option<&CatalogEntry> {
        let title_norm = normalize_name(title);
        let words: Vec<&str> = title_norm.split(' ').filter(|w| !w.is_empty()).collect();
        let longest = words.len().min(MAX_WINDOW_WORDS);

        (1..=longest)
            .rev()
            .find_map(|size| windows(&words, size).find_map(|w| self.resolve(&w)))
    }
}

fn windows<'a>(words: &'a [&'a str], size: usize) -> impl Iterator<Item = String> + 'a {
    let size = size.max(1);
    let count = if words.len() >= size { words.len() - size + 1 } else { 0 };
    (0..count).map(move |start| words[start..start + size].join(" "))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

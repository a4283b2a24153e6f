//! Item catalog snapshot and name matching.
//!
//! The catalog is loaded once from a JSON snapshot and shared read-only
//! between pricing runs.

pub mod fuzzy;
pub mod matcher;
pub mod tables;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::types::CatalogEntry;

pub use matcher::CatalogMatcher;
pub use tables::{AliasTable, DenyList};

/// Canonical comparison form for names: lowercase letters and digits
/// separated by single spaces.
pub fn normalize_name(s: &str) -> String {
    let mapped: String = s
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// On-disk snapshot format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub version: String,
    pub entries: Vec<CatalogEntry>,
}

/// In-memory catalog indexed by normalized name.
#[derive(Debug, Clone)]
pub struct Catalog {
    version: String,
    loaded_at: DateTime<Utc>,
    entries: Vec<CatalogEntry>,
    normalized: Vec<String>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog. Entries whose names normalize to an existing key
    /// are dropped; the first one wins.
    pub fn new(version: &str, entries: Vec<CatalogEntry>) -> Self {
        let mut catalog = Self {
            version: version.to_string(),
            loaded_at: Utc::now(),
            entries: Vec::new(),
            normalized: Vec::new(),
            index: HashMap::new(),
        };
        for entry in entries {
            let key = normalize_name(&entry.name);
            if key.is_empty() {
                warn!(name = %entry.name, "Skipping catalog entry with empty name");
                continue;
            }
            if catalog.index.contains_key(&key) {
                warn!(name = %entry.name, "Duplicate catalog entry ignored");
                continue;
            }
            catalog.index.insert(key.clone(), catalog.entries.len());
            catalog.normalized.push(key);
            catalog.entries.push(entry);
        }
        catalog
    }

    /// Load a catalog snapshot from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .context(format!("Failed to read catalog from {}", path.display()))?;
        let snapshot: CatalogSnapshot = serde_json::from_str(&json)
            .context(format!("Failed to parse catalog from {}", path.display()))?;

        let catalog = Self::new(&snapshot.version, snapshot.entries);
        info!(
            path = %path.display(),
            version = %catalog.version,
            entries = catalog.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Entries paired with their normalized names.
    pub fn iter_normalized(&self) -> impl Iterator<Item = (&str, &CatalogEntry)> {
        self.normalized
            .iter()
            .map(String::as_str)
            .zip(self.entries.iter())
    }

    /// Exact lookup by an already-normalized name.
    pub fn get_normalized(&self, normalized: &str) -> Option<&CatalogEntry> {
        self.index.get(normalized).map(|&i| &self.entries[i])
    }

    /// Exact lookup by display name.
    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.get_normalized(&normalize_name(name))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section has defaults, so a missing file or a partial file still yields a
//! working configuration. Secrets (API keys) are referenced by env-var name
//! and resolved at runtime.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::engine::buckets::IncomeBucket;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub pricer: PricerConfig,
    pub marketplace: MarketplaceConfig,
    pub catalog: CatalogConfig,
    /// Extra variant -> canonical name aliases, merged over the built-in set.
    pub aliases: HashMap<String, String>,
    pub deny_list: DenyListConfig,
    /// Overrides the built-in income bucket table when present.
    pub buckets: Option<Vec<IncomeBucket>>,
}

/// Search and recommendation tuning.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PricerConfig {
    pub page_size: u32,
    /// Total pages fetched per pricing run, across all buckets.
    pub page_budget: u32,
    /// Pause between consecutive page fetches.
    pub fetch_delay_ms: u64,
    pub fetch_timeout_secs: u64,
    /// Abandon a run after this many degraded pages in a row.
    pub max_consecutive_failures: u32,
    /// Targets in the top fraction of their bucket also search the next one.
    pub bucket_edge_fraction: f64,
    pub cache_ttl_secs: i64,
    /// Gap between upper and lower at which the wide undercut applies.
    pub min_gap: Decimal,
    pub wide_undercut: Decimal,
    pub narrow_undercut: Decimal,
    pub price_floor: Decimal,
}

impl Default for PricerConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            page_budget: 200,
            fetch_delay_ms: 300,
            fetch_timeout_secs: 15,
            max_consecutive_failures: 3,
            bucket_edge_fraction: 0.25,
            cache_ttl_secs: 15 * 60,
            min_gap: dec!(1.00),
            wide_undercut: dec!(1.00),
            narrow_undercut: dec!(0.50),
            price_floor: dec!(0.01),
        }
    }
}

/// Listing source settings.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MarketplaceConfig {
    pub name: String,
    pub base_url: String,
    pub game_id: String,
    pub category: String,
    /// Tag carrying the item name on each listing.
    pub item_tag_key: String,
    /// Tag carrying the seller-set rarity modifier.
    pub modifier_tag_key: String,
    /// Title or seller substrings identifying our own listings.
    pub own_store_markers: Vec<String>,
    pub user_agent: String,
    /// Env var holding an optional API key.
    pub api_key_env: Option<String>,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            name: "eldorado".to_string(),
            base_url: "https://www.eldorado.gg".to_string(),
            game_id: "259".to_string(),
            category: "CustomItem".to_string(),
            item_tag_key: "Brainrot".to_string(),
            modifier_tag_key: "Mutations".to_string(),
            own_store_markers: vec!["#gs".to_string(), "glitched store".to_string()],
            user_agent: "undercut/0.1".to_string(),
            api_key_env: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: String,
    pub fuzzy_threshold: f64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: "data/catalog.json".to_string(),
            fuzzy_threshold: 0.88,
        }
    }
}

/// Output of the offline collision analysis.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DenyListConfig {
    pub version: String,
    /// Keep the built-in decoy words and patterns alongside these.
    pub include_builtin: bool,
    pub words: Vec<String>,
    pub patterns: Vec<String>,
}

impl Default for DenyListConfig {
    fn default() -> Self {
        Self {
            version: "builtin".to_string(),
            include_builtin: true,
            words: Vec::new(),
            patterns: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            warn!(path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}

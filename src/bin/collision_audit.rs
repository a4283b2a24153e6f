//! Collision audit
//!
//! Scores common listing-title words against every catalog name and name
//! word, and prints the words that the fuzzy matcher would resolve to an
//! item as a `[deny_list]` config section.
//!
//! **Usage:**
//! ```bash
//! collision_audit --catalog data/catalog.json [--titles titles.txt] [--format json]
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{info, warn};

use undercut::catalog::fuzzy::{fuzzy_key, similarity};
use undercut::catalog::{normalize_name, Catalog, DenyList};
use undercut::config::DenyListConfig;

/// Words that show up in listing titles without naming an item.
const COMMON_TITLE_WORDS: &[&str] = &[
    "trait", "traits", "trade", "trading", "cheap", "cheapest", "fast", "fastest", "delivery",
    "instant", "quick", "asap", "rare", "rarest", "exclusive", "limited", "edition", "secret",
    "brainrot", "steal", "roblox", "account", "mutation", "mutations", "mutated", "second",
    "seconds", "minute", "guaranteed", "discount", "bundle", "package", "entrega", "rapida",
    "christmas", "santa", "holiday", "event", "spider", "trail", "trails", "fire", "speed",
];

/// Name words shorter than this are not scored individually.
const MIN_NAME_WORD_LEN: usize = 5;
/// Title words shorter than this are not collected from title files.
const MIN_TITLE_WORD_LEN: usize = 4;

#[derive(Parser, Debug)]
#[command(name = "collision_audit")]
#[command(about = "Find title words the fuzzy matcher would mistake for catalog items")]
struct Args {
    /// Catalog snapshot
    #[arg(long, default_value = "data/catalog.json")]
    catalog: String,

    /// Optional file of listing titles, one per line; their words are audited too
    #[arg(long, value_name = "FILE")]
    titles: Option<String>,

    /// Similarity at or above which a word collides
    #[arg(long, default_value = "0.88")]
    threshold: f64,

    /// Version label written into the deny-list section
    #[arg(long)]
    label: Option<String>,

    #[arg(long, value_enum, default_value_t = Format::Toml)]
    format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Toml,
    Json,
}

/// One word that scored too close to a catalog name.
#[derive(Debug, Clone, Serialize, PartialEq)]
struct Collision {
    word: String,
    item: String,
    /// The name word matched, when the hit came from a single word.
    via_word: Option<String>,
    score: f64,
}

#[derive(Debug, Serialize)]
struct AuditReport {
    catalog_version: String,
    threshold: f64,
    words_checked: usize,
    collisions: Vec<Collision>,
    /// Catalog names sharing a fuzzy key with another name.
    key_groups: BTreeMap<String, Vec<String>>,
    deny_list: DenyListConfig,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("collision_audit=info,undercut=info")
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let catalog = Catalog::load(&args.catalog)?;

    let mut words: BTreeSet<String> = COMMON_TITLE_WORDS.iter().map(|w| w.to_string()).collect();
    if let Some(path) = &args.titles {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read titles from {path}"))?;
        let before = words.len();
        words.extend(title_words(&text));
        info!(path = %path, added = words.len() - before, "Collected title words");
    }

    let names: Vec<&str> = catalog.entries().iter().map(|e| e.name.as_str()).collect();
    let collisions = audit(&words, &names, args.threshold);
    for c in &collisions {
        warn!(
            word = %c.word,
            item = %c.item,
            via = c.via_word.as_deref().unwrap_or("-"),
            score = c.score,
            "Collision"
        );
    }

    let builtin = DenyList::default();
    let deny_words = new_deny_words(&collisions, &builtin);
    info!(
        builtin_words = builtin.word_count(),
        new_words = deny_words.len(),
        "Deny-list candidates"
    );
    let version = args
        .label
        .unwrap_or_else(|| format!("audit-{}", chrono::Utc::now().format("%Y%m%d")));
    let report = AuditReport {
        catalog_version: catalog.version().to_string(),
        threshold: args.threshold,
        words_checked: words.len(),
        key_groups: key_groups(&names),
        deny_list: DenyListConfig {
            version,
            include_builtin: true,
            words: deny_words,
            patterns: Vec::new(),
        },
        collisions,
    };

    info!(
        words = report.words_checked,
        collisions = report.collisions.len(),
        key_groups = report.key_groups.len(),
        "Audit complete"
    );

    match args.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Toml => {
            let mut section = BTreeMap::new();
            section.insert("deny_list", &report.deny_list);
            print!("{}", toml::to_string(&section)?);
        }
    }
    Ok(())
}

/// Distinct lowercase alphabetic words of a title dump.
fn title_words(text: &str) -> BTreeSet<String> {
    normalize_name(text)
        .split(' ')
        .filter(|w| w.len() >= MIN_TITLE_WORD_LEN && w.chars().all(|c| c.is_ascii_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Score every word against whole names and long name words.
///
/// Words that literally are a catalog name or name word are legitimate
/// mentions and never reported.
fn audit(words: &BTreeSet<String>, names: &[&str], threshold: f64) -> Vec<Collision> {
    let name_words: HashSet<String> = names
        .iter()
        .flat_map(|n| normalize_name(n).split(' ').map(str::to_string).collect::<Vec<_>>())
        .collect();

    let mut out = Vec::new();
    for word in words {
        if name_words.contains(word) {
            continue;
        }
        for name in names {
            let score = similarity(word, name);
            if score >= threshold {
                out.push(Collision {
                    word: word.clone(),
                    item: name.to_string(),
                    via_word: None,
                    score,
                });
                continue;
            }
            for part in normalize_name(name).split(' ') {
                if part.len() < MIN_NAME_WORD_LEN {
                    continue;
                }
                let score = similarity(word, part);
                if score >= threshold {
                    out.push(Collision {
                        word: word.clone(),
                        item: name.to_string(),
                        via_word: Some(part.to_string()),
                        score,
                    });
                    break;
                }
            }
        }
    }
    out.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.word.cmp(&b.word)));
    out
}

/// Colliding words the given deny list does not already cover.
fn new_deny_words(collisions: &[Collision], existing: &DenyList) -> Vec<String> {
    collisions
        .iter()
        .map(|c| c.word.as_str())
        .filter(|w| !existing.denies(w))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Fuzzy keys shared by more than one catalog name.
fn key_groups(names: &[&str]) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for name in names {
        groups.entry(fuzzy_key(name)).or_default().push(name.to_string());
    }
    groups.retain(|_, v| v.len() > 1);
    groups
}

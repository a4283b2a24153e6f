//! UNDERCUT: competitive resale pricing for marketplace listings
//!
//! Entry point. Loads configuration and the item catalog, initialises
//! structured logging, wires the marketplace client into the price
//! controller and answers the command given on the command line.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use futures::future::join_all;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use undercut::catalog::{AliasTable, Catalog, CatalogMatcher, DenyList};
use undercut::config::AppConfig;
use undercut::engine::{CachedPriceFinder, PriceController, PriceFinder};
use undercut::parser::TitleParser;
use undercut::platforms::eldorado::EldoradoClient;
use undercut::platforms::ListingSource;
use undercut::types::PricingQuery;

const BANNER: &str = r#"
 _   _ _   _ ____  _____ ____   ____ _   _ _____
| | | | \ | |  _ \| ____|  _ \ / ___| | | |_   _|
| | | |  \| | | | |  _| | |_) | |   | | | | | |
| |_| | |\  | |_| | |___|  _ <| |___| |_| | | |
 \___/|_| \_|____/|_____|_| \_\\____|\___/  |_|

  Competitive resale pricing
"#;

#[derive(Parser, Debug)]
#[command(version, about = "Price marketplace listings just under the nearest competitor")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, default_value = "config.toml", env = "UNDERCUT_CONFIG")]
    config: String,

    /// Catalog JSON path (overrides config)
    #[arg(long)]
    catalog: Option<String>,

    /// Do not print the startup banner
    #[arg(long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recommend a price for one or more items
    Price {
        /// Items as NAME@INCOME or NAME@INCOME@MODIFIER, e.g. "Meowl@150@Gold"
        #[arg(required = true)]
        items: Vec<ItemSpec>,
    },
    /// Resolve free text to a catalog entry
    Resolve { text: String },
    /// Parse a listing title and print what was extracted
    Parse {
        title: String,
        /// Known item name, stripped before parsing
        #[arg(long)]
        item: Option<String>,
    },
}

/// One item to price, as given on the command line.
#[derive(Debug, Clone)]
struct ItemSpec {
    name: String,
    target_income: f64,
    modifier: Option<String>,
}

impl FromStr for ItemSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split('@').map(str::trim);
        let name = parts.next().unwrap_or_default();
        let Some(income) = parts.next() else {
            bail!("expected NAME@INCOME[@MODIFIER], got {s:?}");
        };
        let modifier = parts.next().filter(|m| !m.is_empty()).map(str::to_string);
        if parts.next().is_some() || name.is_empty() {
            bail!("expected NAME@INCOME[@MODIFIER], got {s:?}");
        }
        let target_income = income
            .parse::<f64>()
            .with_context(|| format!("bad income in {s:?}"))?;
        Ok(Self {
            name: name.to_string(),
            target_income,
            modifier,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let args = Args::parse();
    let cfg = AppConfig::load_or_default(&args.config)?;

    init_logging();

    if !args.quiet {
        eprintln!("{BANNER}");
    }

    match args.command {
        Command::Parse { title, item } => {
            let parser = match item.as_deref() {
                Some(name) => TitleParser::for_item(name, &cfg.marketplace.modifier_tag_key),
                None => TitleParser::default(),
            };
            let parsed = parser.parse(&title);
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }
        Command::Resolve { text } => {
            let matcher = build_matcher(&cfg, args.catalog.as_deref())?;
            match matcher.resolve(&text) {
                Some(entry) => println!("{}", serde_json::to_string_pretty(entry)?),
                None => {
                    warn!(text = %text, "No catalog entry matched");
                    println!("null");
                }
            }
        }
        Command::Price { items } => {
            let matcher = build_matcher(&cfg, args.catalog.as_deref())?;
            let finder = build_finder(&cfg, matcher.clone())?;
            run_price(&finder, &matcher, &items).await?;
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

fn build_matcher(cfg: &AppConfig, catalog_override: Option<&str>) -> Result<Arc<CatalogMatcher>> {
    let path = catalog_override.unwrap_or(&cfg.catalog.path);
    let catalog = Arc::new(Catalog::load(path)?);

    let mut aliases = AliasTable::builtin();
    for (variant, canonical) in &cfg.aliases {
        aliases.insert(variant, canonical);
    }
    let deny = DenyList::from_config(&cfg.deny_list)?;

    let alias_count = aliases.len();
    let matcher = CatalogMatcher::new(catalog, aliases, deny, cfg.catalog.fuzzy_threshold);
    info!(
        catalog_version = %matcher.catalog().version(),
        loaded_at = %matcher.catalog().loaded_at(),
        entries = matcher.catalog().len(),
        aliases = alias_count,
        deny_list = %matcher.deny_list_version(),
        "Catalog matcher ready"
    );

    Ok(Arc::new(matcher))
}

fn build_finder(
    cfg: &AppConfig,
    matcher: Arc<CatalogMatcher>,
) -> Result<CachedPriceFinder<PriceController>> {
    let api_key = match cfg.marketplace.api_key_env.as_deref() {
        Some(env) => match AppConfig::resolve_env(env) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(error = %e, "Marketplace API key missing, continuing anonymously");
                None
            }
        },
        None => None,
    };

    let source: Arc<dyn ListingSource> = Arc::new(EldoradoClient::new(&cfg.marketplace, api_key)?);
    info!(
        source = source.name(),
        page_budget = cfg.pricer.page_budget,
        page_size = cfg.pricer.page_size,
        "Marketplace source ready"
    );

    let controller = PriceController::from_config(cfg, source, matcher);
    Ok(CachedPriceFinder::new(
        controller,
        chrono::Duration::seconds(cfg.pricer.cache_ttl_secs),
    ))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn run_price(
    finder: &CachedPriceFinder<PriceController>,
    matcher: &CatalogMatcher,
    items: &[ItemSpec],
) -> Result<()> {
    let queries: Vec<PricingQuery> = items
        .iter()
        .map(|item| {
            PricingQuery::from_text(
                matcher,
                &item.name,
                item.target_income,
                item.modifier.as_deref(),
            )
            .with_context(|| format!("cannot price {:?}", item.name))
        })
        .collect::<Result<_>>()?;

    let results = join_all(queries.iter().map(|q| finder.find_price_bracket(q))).await;

    let mut report = Vec::with_capacity(queries.len());
    for (query, result) in queries.iter().zip(results) {
        match result {
            Ok(result) => {
                info!(query = %query, result = %result, "Priced");
                report.push(serde_json::json!({ "query": query, "result": result }));
            }
            Err(e) => {
                warn!(query = %query, error = %e, "Pricing failed");
                report.push(serde_json::json!({ "query": query, "error": e.to_string() }));
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Initialise the tracing subscriber with env-filter support.
/// Set UNDERCUT_LOG_JSON=1 for JSON-formatted logs. Logs go to stderr so
/// stdout stays clean JSON.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("undercut=info"));

    let json_logging = std::env::var("UNDERCUT_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}

//! End-to-end pricing runs: scanner, bucket walk, bracket selection and
//! the cache decorator wired together over `MockSource`.

use rust_decimal_macros::dec;
use std::sync::Arc;

use undercut::catalog::{Catalog, CatalogMatcher};
use undercut::config::AppConfig;
use undercut::engine::{CachedPriceFinder, PriceController, PriceFinder};
use undercut::types::{CatalogEntry, Modifier, PricerError, PricingQuery};

use crate::mock_source::{tagged, untagged, MockSource};

fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.pricer.fetch_delay_ms = 0;
    cfg.pricer.fetch_timeout_secs = 2;
    cfg
}

fn matcher() -> Arc<CatalogMatcher> {
    let names = [
        "Meowl",
        "Ginger Girat",
        "Los 25",
        "Garama and Madundung",
        "Sample Item",
    ];
    let catalog = Catalog::new("test", names.iter().map(|n| CatalogEntry::new(n)).collect());
    Arc::new(CatalogMatcher::with_defaults(Arc::new(catalog)))
}

fn controller(cfg: &AppConfig, source: Arc<MockSource>) -> PriceController {
    PriceController::from_config(cfg, source, matcher())
}

fn query(item: &str, target: f64, rarity: Option<Modifier>) -> PricingQuery {
    PricingQuery::new(CatalogEntry::new(item), target, rarity)
}

// ---------------------------------------------------------------------------
// Single page
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_single_listing_narrow_undercut() {
    let source = Arc::new(MockSource::new("mock").with_bucket(
        "0-8",
        vec![vec![untagged("s1", "[1B/S] Sample Item", dec!(24.50))]],
    ));
    let pricer = controller(&test_config(), source.clone());

    let result = pricer
        .find_price_bracket(&query("Sample Item", 1000.0, None))
        .await
        .unwrap();

    let upper = result.upper.as_ref().expect("upper");
    assert_eq!(upper.id, "s1");
    assert_eq!(upper.income(), Some(1000.0));
    assert!(result.lower.is_none());
    assert_eq!(result.recommended_price, Some(dec!(24.00)));
    assert!(!result.exhausted);
    assert_eq!(result.upper_page, Some(1));
    assert_eq!(result.pages_scanned, 1);
    assert_eq!(result.bucket.as_ref().map(|b| b.attribute_id.as_str()), Some("0-8"));

    let first = &source.requests()[0];
    assert_eq!(first.item_name.as_deref(), Some("Sample Item"));
    assert_eq!(first.bucket.as_deref(), Some("0-8"));
    assert_eq!(first.page, 1);
}

#[tokio::test]
async fn test_target_above_every_listing_is_exhausted() {
    let source = Arc::new(MockSource::new("mock").with_bucket(
        "0-8",
        vec![vec![untagged("s1", "[1B/S] Sample Item", dec!(24.50))]],
    ));
    let pricer = controller(&test_config(), source);

    let result = pricer
        .find_price_bracket(&query("Sample Item", 1100.0, None))
        .await
        .unwrap();

    assert!(result.exhausted);
    assert!(result.upper.is_none());
    assert!(result.recommended_price.is_none());
}

// ---------------------------------------------------------------------------
// Multi-page walk with filtering
// ---------------------------------------------------------------------------

fn meowl_market() -> MockSource {
    MockSource::new("mock").with_bucket(
        "0-4",
        vec![
            vec![
                tagged("m1", "Meowl", "Meowl 120M/s", dec!(3)),
                tagged("g1", "Ginger Girat", "Ginger Girat 500M/s", dec!(3.50)),
                tagged("m2", "Meowl", "Meowl 140M/s fast", dec!(4)),
                tagged("r1", "Meowl", "Meowl 50-200M/s random", dec!(4.20)),
            ],
            vec![
                tagged("own", "Meowl", "Meowl 150M/s #GS", dec!(5)),
                tagged("m3", "Meowl", "Meowl 145M/s", dec!(5.50)),
                tagged("m4", "Meowl", "Meowl 160M/s", dec!(6)),
                tagged("gold", "Meowl", "Gold Meowl 170M/s", dec!(6.50)),
                tagged("m5", "Meowl", "Meowl 200M/s", dec!(8)),
            ],
        ],
    )
}

#[tokio::test]
async fn test_upper_found_on_second_page() {
    let source = Arc::new(meowl_market());
    let pricer = controller(&test_config(), source.clone());

    let result = pricer
        .find_price_bracket(&query("Meowl", 150.0, None))
        .await
        .unwrap();

    // own listing, other item, range and gold all filtered out
    assert_eq!(result.upper.as_ref().unwrap().id, "m4");
    assert_eq!(result.lower.as_ref().unwrap().id, "m3");
    assert_eq!(result.next_competitor.as_ref().unwrap().id, "m5");
    // gap 0.50 < 1.00
    assert_eq!(result.recommended_price, Some(dec!(5.50)));
    assert_eq!(result.upper_page, Some(2));
    assert_eq!(result.pages_scanned, 2);
    assert_eq!(result.page_median_price, Some(dec!(6)));

    let pages: Vec<u32> = source.requests().iter().map(|r| r.page).collect();
    assert_eq!(pages, vec![1, 2]);
}

#[tokio::test]
async fn test_rarity_query_only_sees_that_rarity() {
    let source = Arc::new(meowl_market());
    let pricer = controller(&test_config(), source.clone());

    let result = pricer
        .find_price_bracket(&query("Meowl", 150.0, Some(Modifier::Gold)))
        .await
        .unwrap();

    assert_eq!(result.upper.as_ref().unwrap().id, "gold");
    assert!(result.lower.is_none());
    assert_eq!(result.recommended_price, Some(dec!(6.00)));
    assert_eq!(source.requests()[0].rarity, Some(Modifier::Gold));
}

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_near_edge_target_checks_next_bucket() {
    let source = Arc::new(
        MockSource::new("mock")
            .with_bucket("0-4", vec![vec![tagged("a", "Meowl", "Meowl 230M/s", dec!(7))]])
            .with_bucket("0-5", vec![vec![tagged("b", "Meowl", "Meowl 260M/s", dec!(9))]]),
    );
    let pricer = controller(&test_config(), source.clone());

    let result = pricer
        .find_price_bracket(&query("Meowl", 240.0, None))
        .await
        .unwrap();

    assert_eq!(result.upper.as_ref().unwrap().id, "b");
    assert!(result.next_bucket_checked);
    assert_eq!(result.bucket.as_ref().unwrap().attribute_id, "0-5");
    // lower is only searched on upper's page
    assert!(result.lower.is_none());
    assert_eq!(result.recommended_price, Some(dec!(8.50)));

    let buckets: Vec<Option<String>> = source.requests().into_iter().map(|r| r.bucket).collect();
    assert_eq!(buckets, vec![Some("0-4".to_string()), Some("0-5".to_string())]);
}

#[tokio::test]
async fn test_page_budget_caps_run() {
    let pages: Vec<_> = (0..10)
        .map(|i| vec![tagged(&format!("p{i}"), "Meowl", "Meowl 110M/s", dec!(2))])
        .collect();
    let source = Arc::new(MockSource::new("mock").with_bucket("0-4", pages));
    let mut cfg = test_config();
    cfg.pricer.page_budget = 4;
    let pricer = controller(&cfg, source.clone());

    let result = pricer
        .find_price_bracket(&query("Meowl", 150.0, None))
        .await
        .unwrap();

    assert!(result.exhausted);
    assert_eq!(result.pages_scanned, 4);
    assert_eq!(source.request_count(), 4);
}

// ---------------------------------------------------------------------------
// Failure handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_failing_source_degrades_to_exhausted() {
    let source = Arc::new(meowl_market());
    source.set_error("503 Service Unavailable");
    let pricer = controller(&test_config(), source.clone());

    let result = pricer
        .find_price_bracket(&query("Meowl", 150.0, None))
        .await
        .unwrap();

    assert!(result.exhausted);
    assert_eq!(result.pages_scanned, 3);
    assert_eq!(source.request_count(), 3);
}

#[tokio::test]
async fn test_invalid_query_makes_no_requests() {
    let source = Arc::new(meowl_market());
    let pricer = controller(&test_config(), source.clone());

    let err = pricer
        .find_price_bracket(&query("Meowl", 0.0, None))
        .await
        .unwrap_err();

    assert!(matches!(err, PricerError::InvalidQuery(_)));
    assert_eq!(source.request_count(), 0);
}

// ---------------------------------------------------------------------------
// Cache and query construction
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_cached_finder_skips_repeat_scans() {
    let source = Arc::new(meowl_market());
    let pricer = CachedPriceFinder::with_default_ttl(controller(&test_config(), source.clone()));
    let q = query("Meowl", 150.0, None);

    let first = pricer.find_price_bracket(&q).await.unwrap();
    let requests = source.request_count();
    let second = pricer.find_price_bracket(&q).await.unwrap();

    assert_eq!(first.recommended_price, second.recommended_price);
    assert_eq!(source.request_count(), requests);
    assert_eq!(pricer.len(), 1);
}

#[tokio::test]
async fn test_query_from_free_text() {
    let matcher = matcher();
    let source = Arc::new(meowl_market());
    let pricer = PriceController::from_config(&test_config(), source, matcher.clone());

    let q = PricingQuery::from_text(&matcher, "meowl", 150.0, Some("gold")).unwrap();
    assert_eq!(q.entry.name, "Meowl");
    assert_eq!(q.rarity, Some(Modifier::Gold));
    let result = pricer.find_price_bracket(&q).await.unwrap();
    assert_eq!(result.upper.unwrap().id, "gold");

    assert!(matches!(
        PricingQuery::from_text(&matcher, "definitely not an item", 150.0, None),
        Err(PricerError::UnresolvedItem(_))
    ));
    assert!(matches!(
        PricingQuery::from_text(&matcher, "Meowl", 150.0, Some("sparkly")),
        Err(PricerError::UnknownModifier(_))
    ));
}

// ---------------------------------------------------------------------------
// Shipped data files
// ---------------------------------------------------------------------------

#[test]
fn test_shipped_catalog_and_config_load() {
    let root = env!("CARGO_MANIFEST_DIR");
    let catalog = Catalog::load(format!("{root}/data/catalog.json")).unwrap();
    assert!(catalog.get("Meowl").is_some());
    assert!(catalog.get("sample item").is_some());

    let cfg = AppConfig::load(&format!("{root}/config.toml")).unwrap();
    assert_eq!(cfg.pricer.page_budget, 200);
    assert_eq!(cfg.catalog.path, "data/catalog.json");
    assert!(cfg.aliases.contains_key("garama madundung"));
}

//! Type-ahead suggestions over the hosted product catalog.

use showmyfit_core::ProductStatus;
use showmyfit_integration_tests::{FakeBackend, product, product_with_status};
use showmyfit_storefront::search::SuggestionEngine;

fn catalog() -> FakeBackend {
    FakeBackend::with_products(vec![
        product("coat", "Wool Coat", "Maison Laine"),
        product("jacket", "Denim Jacket", "Blue Co"),
        product_with_status("sold-coat", "Trench Coat", "Blue Co", ProductStatus::Sold),
        product_with_status("old-coat", "Rain Coat", "Maison Laine", ProductStatus::Archived),
    ])
}

#[tokio::test]
async fn test_typeahead_session_fetches_the_catalog_once() {
    let backend = catalog();
    let engine = SuggestionEngine::new(backend.clone());

    // A user typing "c", "co", "coa" issues a query per keystroke.
    for query in ["c", "co", "coa"] {
        let results = engine.suggestions(query).await.unwrap();
        assert!(!results.is_empty());
    }

    assert_eq!(backend.catalog_calls(), 1);
}

#[tokio::test]
async fn test_only_active_products_are_suggested() {
    let engine = SuggestionEngine::new(catalog());

    let results = engine.suggestions("coat").await.unwrap();
    let ids: Vec<&str> = results.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["coat"]);
}

#[tokio::test]
async fn test_brand_queries_match_case_insensitively() {
    let engine = SuggestionEngine::new(catalog());

    let results = engine.suggestions("mAiSoN").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id.as_str(), "coat");
    // Suggestion rows render a price tag alongside the name.
    assert_eq!(results[0].price_tag().display(), "$49.99");
}

#[tokio::test]
async fn test_outage_during_typeahead_recovers_on_next_keystroke() {
    let backend = catalog();
    let engine = SuggestionEngine::new(backend.clone());

    backend.set_failing(true);
    assert!(engine.suggestions("coat").await.is_err());

    backend.set_failing(false);
    let results = engine.suggestions("coat").await.unwrap();
    assert_eq!(results.len(), 1);
}

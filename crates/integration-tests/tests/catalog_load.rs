//! Catalog loading, ordering, counts and search over a scripted source.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use bazaar_core::ProductId;
use bazaar_integration_tests::{Call, ScriptedSource, sample_seed};
use bazaar_storefront::catalog::{CatalogError, CatalogStore, SearchOptions, SearchSort};

fn store() -> (Arc<ScriptedSource>, Arc<CatalogStore<ScriptedSource>>) {
    let source = Arc::new(ScriptedSource::from_json(sample_seed()));
    let catalog = Arc::new(CatalogStore::new(Arc::clone(&source)));
    (source, catalog)
}

#[tokio::test]
async fn test_load_sorts_by_name_and_recounts_categories() {
    let (source, catalog) = store();
    catalog.load().await.unwrap();

    let ids: Vec<i64> = catalog.products().iter().map(|p| p.id.as_i64()).collect();
    assert_eq!(ids, [4, 5, 3, 2, 1]);

    let products = catalog.products();
    for category in catalog.categories() {
        let expected = products.iter().filter(|p| p.category == category.name).count();
        assert_eq!(category.product_count, expected, "{}", category.name);
    }

    let calls = source.calls();
    assert!(calls.contains(&Call::ListProducts));
    assert!(calls.contains(&Call::ListCategories));
}

#[tokio::test]
async fn test_failed_load_keeps_previous_catalog() {
    let (source, catalog) = store();
    catalog.load().await.unwrap();

    source.fail_lists(true);
    let err = catalog.load().await.unwrap_err();
    assert!(matches!(err, CatalogError::Source(_)));
    assert_eq!(catalog.products().len(), 5);
    assert!(catalog.last_error().unwrap().contains("503"));
    assert!(!catalog.is_loading());

    source.fail_lists(false);
    catalog.load().await.unwrap();
    assert!(catalog.last_error().is_none());
}

#[tokio::test]
async fn test_superseded_load_does_not_overwrite_newer_one() {
    let (source, catalog) = store();
    let gate = source.hold_next_list();

    let slow = tokio::spawn({
        let catalog = Arc::clone(&catalog);
        async move { catalog.load().await }
    });
    while !source.calls().contains(&Call::ListProducts) {
        tokio::task::yield_now().await;
    }
    assert!(catalog.is_loading());

    source.remote_rename(ProductId::new(1), "Yerba nueva").await;
    catalog.load().await.unwrap();
    assert_eq!(
        catalog.get_by_id(ProductId::new(1)).unwrap().name,
        "Yerba nueva"
    );

    gate.notify_one();
    slow.await.unwrap().unwrap();

    assert_eq!(
        catalog.get_by_id(ProductId::new(1)).unwrap().name,
        "Yerba nueva"
    );
    assert!(!catalog.is_loading());
}

#[tokio::test]
async fn test_blank_search_for_both_entry_points() {
    let (_, catalog) = store();
    catalog.load().await.unwrap();

    assert_eq!(catalog.search_all("").len(), 5);
    assert!(catalog.search_suggestions("", 5).is_empty());
}

#[tokio::test]
async fn test_search_page_and_suggestions() {
    let (_, catalog) = store();
    catalog.load().await.unwrap();

    let suggestions = catalog.search_suggestions("almacén", 5);
    assert_eq!(suggestions.len(), 2);

    let options = SearchOptions {
        category: None,
        sort: SearchSort::Relevance,
    };
    let results: Vec<i64> = catalog
        .search_results("mate", &options)
        .iter()
        .map(|p| p.id.as_i64())
        .collect();
    assert_eq!(results, [1, 5]);
}

#[tokio::test]
async fn test_remote_lookup_does_not_touch_catalog() {
    let (source, catalog) = store();
    let lookup = catalog.get_by_id_remote(ProductId::new(2)).await.unwrap();
    assert_eq!(lookup.product.name, "Termo");
    assert!(catalog.products().is_empty());
    assert!(source.calls().contains(&Call::GetProduct(ProductId::new(2))));
}

#[tokio::test]
async fn test_load_started_before_stock_update_is_discarded() {
    let (source, catalog) = store();
    catalog.load().await.unwrap();
    let gate = source.hold_next_list();

    let slow = tokio::spawn({
        let catalog = Arc::clone(&catalog);
        async move { catalog.load().await }
    });
    while source.calls().iter().filter(|c| **c == Call::ListProducts).count() < 2 {
        tokio::task::yield_now().await;
    }

    catalog.update_stock(ProductId::new(1), 0).await.unwrap();
    gate.notify_one();
    slow.await.unwrap().unwrap();

    assert_eq!(catalog.stock_of(ProductId::new(1)), Some(0));
    assert_eq!(source.stock_of(ProductId::new(1)), Some(0));

    catalog.load().await.unwrap();
    assert_eq!(catalog.stock_of(ProductId::new(1)), Some(0));
}

#[tokio::test]
async fn test_dropped_load_is_no_longer_pending() {
    let (source, catalog) = store();
    let _gate = source.hold_next_list();

    let slow = tokio::spawn({
        let catalog = Arc::clone(&catalog);
        async move { catalog.load().await }
    });
    while !source.calls().contains(&Call::ListProducts) {
        tokio::task::yield_now().await;
    }
    assert!(catalog.is_loading());

    slow.abort();
    assert!(slow.await.unwrap_err().is_cancelled());
    assert!(!catalog.is_loading());

    catalog.ensure_loaded().await.unwrap();
    assert_eq!(catalog.products().len(), 5);
    assert!(catalog.is_ready());
}

//! Seller flows: listing, restocking and deleting products.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use bazaar_core::{Category, ListingDraft, Price, Product, ProductId, UserId};
use bazaar_integration_tests::{Call, ScriptedSource, sample_seed};
use bazaar_storefront::catalog::{CatalogError, CatalogStore, StockAdjustment};

async fn catalog() -> (Arc<ScriptedSource>, CatalogStore<ScriptedSource>) {
    let source = Arc::new(ScriptedSource::from_json(sample_seed()));
    let catalog = CatalogStore::new(Arc::clone(&source));
    catalog.load().await.unwrap();
    source.reset_calls();
    (source, catalog)
}

fn contents(catalog: &CatalogStore<ScriptedSource>) -> (Vec<Product>, Vec<Category>) {
    (catalog.products(), catalog.categories())
}

fn named<'a>(categories: &'a [Category], name: &str) -> Vec<&'a Category> {
    categories.iter().filter(|c| c.name == name).collect()
}

fn draft(category: &str) -> ListingDraft {
    ListingDraft {
        name: "  Remera de algodón ".to_string(),
        description: "Remera lisa de algodón peinado, talle M".to_string(),
        category: category.to_string(),
        price: "12000.50".to_string(),
        stock: "4".to_string(),
        images: vec!["https://img.example.com/remera.jpg".to_string()],
        user_id: Some(UserId::new(10)),
    }
}

#[tokio::test]
async fn test_listing_in_new_category_creates_it_first() {
    let (source, catalog) = catalog().await;
    let created = catalog
        .create_product(draft("Indumentaria").parse().unwrap())
        .await
        .unwrap();

    assert_eq!(created.name, "Remera de algodón");
    assert_eq!(created.price, Price::from_minor_units(1_200_050));
    assert_eq!(
        source.calls(),
        [
            Call::CreateCategory("Indumentaria".to_string()),
            Call::CreateProduct("Remera de algodón".to_string()),
        ]
    );
    let category = catalog
        .categories()
        .into_iter()
        .find(|c| c.name == "Indumentaria")
        .unwrap();
    assert_eq!(category.product_count, 1);
    assert_eq!(catalog.products_by_owner(UserId::new(10)).len(), 3);
}

#[tokio::test]
async fn test_listing_in_known_category_reuses_it() {
    let (source, catalog) = catalog().await;
    catalog
        .create_product(draft("Ropa").parse().unwrap())
        .await
        .unwrap();
    assert_eq!(
        source.calls(),
        [Call::CreateProduct("Remera de algodón".to_string())]
    );
    let ropa = catalog
        .categories()
        .into_iter()
        .find(|c| c.name == "Ropa")
        .unwrap();
    assert_eq!(ropa.product_count, 1);
}

#[test]
fn test_draft_reports_every_problem() {
    let mut bad = draft("");
    bad.price = "12.345".to_string();
    bad.stock = "-1".to_string();
    bad.description = "muy corta".to_string();

    let errors = bad.parse().unwrap_err();
    for field in ["price", "stock", "category", "description"] {
        assert!(errors.has(field), "missing {field} in {errors}");
    }
    assert!(!errors.has("name"));
}

#[tokio::test]
async fn test_negative_stock_is_rejected_before_any_call() {
    let (source, catalog) = catalog().await;
    let err = catalog.update_stock(ProductId::new(1), -5).await.unwrap_err();
    assert!(matches!(err, CatalogError::Validation(_)));
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn test_stock_update_is_read_then_write() {
    let (source, catalog) = catalog().await;
    let updated = catalog
        .adjust_stock(ProductId::new(5), StockAdjustment::Subtract(2))
        .await
        .unwrap();
    assert_eq!(updated.stock, 5);
    assert_eq!(
        source.calls(),
        [
            Call::GetProduct(ProductId::new(5)),
            Call::UpdateProduct(ProductId::new(5)),
        ]
    );
    assert_eq!(catalog.stock_of(ProductId::new(5)), Some(5));
}

#[tokio::test]
async fn test_failed_update_leaves_local_stock() {
    let (source, catalog) = catalog().await;
    source.fail_updates_for(ProductId::new(4));
    let err = catalog
        .adjust_stock(ProductId::new(4), StockAdjustment::Set(0))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Source(_)));
    assert_eq!(catalog.stock_of(ProductId::new(4)), Some(12));
}

#[tokio::test]
async fn test_delete_missing_product_is_not_found() {
    let (_, catalog) = catalog().await;
    catalog.delete_product(ProductId::new(2)).await.unwrap();
    let err = catalog.delete_product(ProductId::new(2)).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(id) if id == ProductId::new(2)));

    let hogar = catalog
        .categories()
        .into_iter()
        .find(|c| c.name == "Hogar")
        .unwrap();
    assert_eq!(hogar.product_count, 1);
}

#[tokio::test]
async fn test_failed_product_create_keeps_new_category_for_retry() {
    let (source, catalog) = catalog().await;
    let products_before = catalog.products();
    source.fail_creates(true);

    let err = catalog
        .create_product(draft("Indumentaria").parse().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Source(_)));
    assert_eq!(catalog.products(), products_before);
    let categories = catalog.categories();
    let indumentaria = named(&categories, "Indumentaria");
    assert_eq!(indumentaria.len(), 1);
    assert_eq!(indumentaria[0].product_count, 0);

    source.fail_creates(false);
    source.reset_calls();
    catalog
        .create_product(draft("Indumentaria").parse().unwrap())
        .await
        .unwrap();
    assert_eq!(
        source.calls(),
        [Call::CreateProduct("Remera de algodón".to_string())]
    );

    catalog.load().await.unwrap();
    let categories = catalog.categories();
    let indumentaria = named(&categories, "Indumentaria");
    assert_eq!(indumentaria.len(), 1);
    assert_eq!(indumentaria[0].product_count, 1);
}

#[tokio::test]
async fn test_failed_category_create_leaves_catalog_untouched() {
    let (source, catalog) = catalog().await;
    let before = contents(&catalog);
    source.fail_category_creates(true);

    let err = catalog
        .create_product(draft("Indumentaria").parse().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Source(_)));
    assert_eq!(contents(&catalog), before);
    assert_eq!(
        source.calls(),
        [Call::CreateCategory("Indumentaria".to_string())]
    );
}

#[tokio::test]
async fn test_failed_product_create_in_known_category_leaves_catalog_untouched() {
    let (source, catalog) = catalog().await;
    let before = contents(&catalog);
    source.fail_creates(true);

    let err = catalog
        .create_product(draft("Ropa").parse().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Source(_)));
    assert_eq!(contents(&catalog), before);
}

#[tokio::test]
async fn test_failed_delete_leaves_catalog_untouched() {
    let (source, catalog) = catalog().await;
    let before = contents(&catalog);
    source.fail_deletes(true);

    let err = catalog.delete_product(ProductId::new(2)).await.unwrap_err();
    assert!(matches!(err, CatalogError::Source(_)));
    assert_eq!(contents(&catalog), before);
    assert_eq!(source.stock_of(ProductId::new(2)), Some(5));
}

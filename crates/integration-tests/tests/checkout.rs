//! Checkout scenarios: validation, sequential debits and partial failure.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use bazaar_core::{Price, ProductId};
use bazaar_integration_tests::{Call, ScriptedSource, sample_seed};
use bazaar_storefront::cart::{CartError, CartStore, CheckoutError};
use bazaar_storefront::catalog::{CatalogError, CatalogStore};
use bazaar_storefront::error::StoreError;
use bazaar_storefront::session::MemorySessionStore;

async fn setup() -> (Arc<ScriptedSource>, CartStore<ScriptedSource>) {
    let source = Arc::new(ScriptedSource::from_json(sample_seed()));
    let catalog = Arc::new(CatalogStore::new(Arc::clone(&source)));
    catalog.load().await.unwrap();
    let cart = CartStore::new(catalog, Arc::new(MemorySessionStore::new()));
    (source, cart)
}

fn add(cart: &CartStore<ScriptedSource>, id: i64, quantity: u32) {
    let product = cart.catalog().get_by_id(ProductId::new(id)).unwrap();
    cart.add_to_cart(&product, quantity).unwrap();
}

#[tokio::test]
async fn test_single_item_checkout_debits_to_zero() {
    let (source, cart) = setup().await;
    add(&cart, 1, 3);

    let receipt = cart.checkout().await.unwrap();

    assert_eq!(receipt.total, Price::from_minor_units(3250 * 3));
    assert_eq!(receipt.items.len(), 1);
    assert_eq!(receipt.items[0].quantity, 3);
    assert_eq!(source.stock_of(ProductId::new(1)), Some(0));
    assert!(cart.items().is_empty());
}

#[tokio::test]
async fn test_failed_validation_issues_no_updates() {
    let (source, cart) = setup().await;
    add(&cart, 2, 2);
    add(&cart, 1, 3);

    source.remote_set_stock(ProductId::new(1), 1).await;
    cart.catalog().load().await.unwrap();
    source.reset_calls();

    let err = cart.checkout().await.unwrap_err();
    let CheckoutError::StockConflict(problems) = err else {
        panic!("expected a stock conflict");
    };
    assert_eq!(problems, ["yerba mate: only 1 left (3 in cart)"]);
    assert!(source.update_calls().is_empty());
    assert!(source.calls().is_empty());
    assert_eq!(cart.items().len(), 2);
}

#[tokio::test]
async fn test_empty_cart_is_rejected() {
    let (source, cart) = setup().await;
    source.reset_calls();
    assert!(matches!(cart.checkout().await, Err(CheckoutError::EmptyCart)));
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn test_second_debit_failure_keeps_first_and_cart() {
    let (source, cart) = setup().await;
    add(&cart, 2, 2);
    add(&cart, 5, 1);
    let before = cart.items();
    source.fail_updates_for(ProductId::new(5));

    let err = cart.checkout().await.unwrap_err();
    match &err {
        CheckoutError::PartiallyDebited {
            applied,
            failed,
            source: CatalogError::Source(_),
        } => {
            assert_eq!(applied, &[ProductId::new(2)]);
            assert_eq!(*failed, ProductId::new(5));
        }
        other => panic!("expected a partial debit, got {other:?}"),
    }

    assert_eq!(cart.items(), before);
    assert_eq!(source.stock_of(ProductId::new(2)), Some(3));
    assert_eq!(source.stock_of(ProductId::new(5)), Some(7));
    assert_eq!(
        source.update_calls(),
        [ProductId::new(2), ProductId::new(5)]
    );

    let err = StoreError::from(err);
    assert!(err.is_partial_failure());
    assert!(err.user_message().contains("Some items may have been affected"));
}

#[tokio::test]
async fn test_debits_run_in_cart_order() {
    let (source, cart) = setup().await;
    add(&cart, 5, 1);
    add(&cart, 4, 2);
    add(&cart, 2, 1);
    source.reset_calls();

    cart.checkout().await.unwrap();

    assert_eq!(
        source.update_calls(),
        [ProductId::new(5), ProductId::new(4), ProductId::new(2)]
    );
    let gets: Vec<_> = source
        .calls()
        .into_iter()
        .filter(|call| matches!(call, Call::GetProduct(_)))
        .collect();
    assert_eq!(gets.len(), 3);
}

#[tokio::test]
async fn test_retry_after_partial_failure_walks_every_item_again() {
    let (source, cart) = setup().await;
    add(&cart, 2, 2);
    add(&cart, 5, 1);
    source.fail_updates_for(ProductId::new(5));
    cart.checkout().await.unwrap_err();

    // Termo now has 3 left, still enough for the 2 in the cart, so the retry
    // passes validation and debits it a second time.
    source.reset_calls();
    let err = cart.checkout().await.unwrap_err();
    assert!(matches!(err, CheckoutError::PartiallyDebited { .. }));
    assert_eq!(source.stock_of(ProductId::new(2)), Some(1));
    assert_eq!(
        source.update_calls(),
        [ProductId::new(2), ProductId::new(5)]
    );
}

#[tokio::test]
async fn test_load_in_flight_during_checkout_cannot_restore_sold_stock() {
    let (source, cart) = setup().await;
    add(&cart, 1, 3);
    let gate = source.hold_next_list();

    let reload = tokio::spawn({
        let catalog = Arc::clone(cart.catalog());
        async move { catalog.load().await }
    });
    while source.calls().iter().filter(|c| **c == Call::ListProducts).count() < 2 {
        tokio::task::yield_now().await;
    }

    cart.checkout().await.unwrap();
    gate.notify_one();
    reload.await.unwrap().unwrap();

    assert_eq!(cart.catalog().stock_of(ProductId::new(1)), Some(0));
    let yerba = cart.catalog().get_by_id(ProductId::new(1)).unwrap();
    let err = cart.add_to_cart(&yerba, 3).unwrap_err();
    assert!(matches!(err, CartError::OutOfStock { .. }));
    assert!(matches!(cart.checkout().await, Err(CheckoutError::EmptyCart)));
}

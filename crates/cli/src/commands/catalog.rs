//! Catalog browsing commands.

use bazaar_core::{ProductId, ValidationError};
use bazaar_storefront::catalog::{LookupOrigin, SearchOptions, SearchSort, result_categories};
use bazaar_storefront::error::StoreError;
use bazaar_storefront::state::AppState;

use super::{currency, print_products};
use crate::SearchArgs;

/// List products, optionally filtered by exact category.
pub fn products(state: &AppState, category: Option<&str>) -> Result<(), StoreError> {
    let products = match category {
        Some(category) => state.catalog().filter_by_category(category),
        None => state.catalog().products(),
    };
    print_products(&products, currency(state));
    Ok(())
}

/// List categories with product counts.
#[allow(clippy::print_stdout)]
pub fn categories(state: &AppState) -> Result<(), StoreError> {
    for category in state.catalog().categories() {
        println!("{:<24} {:>4}", category.name, category.product_count);
    }
    Ok(())
}

/// Run a search, as inline suggestions or as the results page.
#[allow(clippy::print_stdout)]
pub fn search(state: &AppState, args: &SearchArgs) -> Result<(), StoreError> {
    let catalog = state.catalog();
    if args.suggest {
        print_products(&catalog.default_suggestions(&args.term), currency(state));
        return Ok(());
    }

    let sort = args.sort.parse::<SearchSort>().map_err(|message| {
        StoreError::Validation(ValidationError::new("sort", message).into())
    })?;
    let options = SearchOptions {
        category: args.category.clone(),
        sort,
    };
    let results = catalog.search_results(&args.term, &options);
    println!("{} result(s) for \"{}\"", results.len(), args.term.trim());
    print_products(&results, currency(state));

    let categories = result_categories(&results);
    if !categories.is_empty() {
        println!("Categories: {}", categories.join(", "));
    }
    Ok(())
}

/// Show one product.
#[allow(clippy::print_stdout)]
pub async fn show(state: &AppState, id: i64) -> Result<(), StoreError> {
    let lookup = state.catalog().get_by_id_remote(ProductId::new(id)).await?;
    let product = &lookup.product;
    let currency = currency(state);

    println!("{} (#{})", product.name, product.id);
    println!("  Price:    {}", product.price.display(currency));
    println!("  Category: {}", product.category);
    println!("  Stock:    {} ({})", product.stock, product.stock_level());
    println!("  Image:    {}", product.primary_image());
    if !product.description.is_empty() {
        println!("  {}", product.description);
    }
    if state.cart().is_in_cart(product.id) {
        println!("  In your cart: {}", state.cart().item_quantity(product.id));
    }
    if lookup.origin == LookupOrigin::Remote {
        println!("  (fetched from the store; not in the loaded catalog)");
    }
    Ok(())
}

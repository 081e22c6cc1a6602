//! Command implementations.
//!
//! Commands write their results to stdout; logs and errors go to stderr.

pub mod cart;
pub mod catalog;
pub mod sell;
pub mod session;

use bazaar_core::{CartLineItem, CurrencyCode, Product, UserId, ValidationError};
use bazaar_storefront::error::StoreError;
use bazaar_storefront::state::AppState;

/// Report `err`, tell the user what went wrong and exit.
#[allow(clippy::print_stderr)]
pub fn fail(err: &StoreError) -> ! {
    let event_id = err.report();
    eprintln!("error: {}", err.user_message());
    if let Some(id) = event_id {
        eprintln!("(reference: {id})");
    }
    std::process::exit(if err.is_user_correctable() { 2 } else { 1 });
}

/// The logged-in user's id, or an error asking to log in.
fn require_user(state: &AppState) -> Result<UserId, StoreError> {
    state
        .current_user()?
        .map(|user| user.id)
        .ok_or_else(|| {
            StoreError::Validation(
                ValidationError::new("user", "log in first with `bazaar login`").into(),
            )
        })
}

fn currency(state: &AppState) -> CurrencyCode {
    state.config().currency
}

#[allow(clippy::print_stdout)]
fn print_products(products: &[Product], currency: CurrencyCode) {
    if products.is_empty() {
        println!("No products found.");
        return;
    }
    for product in products {
        println!(
            "{:>6}  {:<32} {:>14}  {:<16} {} ({})",
            product.id,
            product.name,
            product.price.display(currency),
            product.category,
            product.stock_level(),
            product.stock
        );
    }
}

#[allow(clippy::print_stdout)]
fn print_line_items(items: &[CartLineItem], currency: CurrencyCode) {
    for item in items {
        println!(
            "{:>6}  {:<32} {:>3} × {:>12} = {:>14}",
            item.id,
            item.name,
            item.quantity,
            item.price.display(currency),
            item.line_total().display(currency)
        );
    }
}

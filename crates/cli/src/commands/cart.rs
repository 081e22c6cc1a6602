//! Cart commands.

use bazaar_core::ProductId;
use bazaar_storefront::cart::CartError;
use bazaar_storefront::error::StoreError;
use bazaar_storefront::state::AppState;

use super::{currency, print_line_items};
use crate::CartAction;

/// Run a cart subcommand.
#[allow(clippy::print_stdout)]
pub async fn run(state: &AppState, action: CartAction) -> Result<(), StoreError> {
    let cart = state.cart();
    match action {
        CartAction::Show => show(state),
        CartAction::Add { id, quantity } => {
            let id = ProductId::new(id);
            let product = state
                .catalog()
                .get_by_id(id)
                .ok_or(CartError::NotFound(id))?;
            println!("{}", cart.add_to_cart(&product, quantity)?);
            Ok(())
        }
        CartAction::Update { id, quantity } => {
            let id = ProductId::new(id);
            cart.update_quantity(id, quantity);
            let now = cart.item_quantity(id);
            if quantity > 0 && i64::from(now) < quantity {
                println!("Only {now} available; quantity set to {now}.");
            }
            show(state)
        }
        CartAction::Remove { id } => {
            cart.remove_from_cart(ProductId::new(id));
            show(state)
        }
        CartAction::Clear => {
            cart.clear_cart();
            println!("Cart cleared.");
            Ok(())
        }
        CartAction::Validate => {
            let problems = cart.validate_stock();
            if problems.is_empty() {
                println!("Everything in your cart is available.");
            }
            for problem in problems {
                println!("- {problem}");
            }
            Ok(())
        }
        CartAction::Checkout => {
            let receipt = cart.checkout().await?;
            println!("Order {} placed at {}", receipt.id, receipt.timestamp.to_rfc3339());
            print_line_items(&receipt.items, currency(state));
            println!("Total: {}", receipt.total.display(currency(state)));
            Ok(())
        }
    }
}

#[allow(clippy::print_stdout)]
fn show(state: &AppState) -> Result<(), StoreError> {
    let cart = state.cart();
    let items = cart.items();
    if items.is_empty() {
        println!("Your cart is empty.");
        return Ok(());
    }
    print_line_items(&items, currency(state));
    println!(
        "{} item(s), total {}",
        cart.total_items(),
        cart.total_price().display(currency(state))
    );
    Ok(())
}

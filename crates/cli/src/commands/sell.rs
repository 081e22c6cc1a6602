//! Seller commands: listing, restocking and deleting your own products.

use bazaar_core::{ListingDraft, ProductId, UserId, ValidationError};
use bazaar_storefront::catalog::{StockAdjustment, parse_stock};
use bazaar_storefront::error::StoreError;
use bazaar_storefront::state::AppState;

use super::{currency, print_products, require_user};
use crate::{ListingArgs, SellAction, StockChange};

/// Run a seller subcommand. Every action requires a logged-in user.
#[allow(clippy::print_stdout)]
pub async fn run(state: &AppState, action: SellAction) -> Result<(), StoreError> {
    let user = require_user(state)?;
    let catalog = state.catalog();

    match action {
        SellAction::Create(args) => {
            let product = catalog.create_product(draft(args, user).parse()?).await?;
            println!("Listed {} as #{}", product.name, product.id);
        }
        SellAction::Stock(args) => {
            let id = ProductId::new(args.id);
            ensure_owner(state, id, user)?;
            let adjustment = adjustment(args.change)?;
            let product = catalog.adjust_stock(id, adjustment).await?;
            println!("{} now has {} in stock", product.name, product.stock);
        }
        SellAction::Delete { id } => {
            let id = ProductId::new(id);
            ensure_owner(state, id, user)?;
            catalog.delete_product(id).await?;
            println!("Deleted #{id}");
        }
        SellAction::Mine => {
            print_products(&catalog.products_by_owner(user), currency(state));
        }
    }
    Ok(())
}

fn draft(args: ListingArgs, user: UserId) -> ListingDraft {
    ListingDraft {
        name: args.name,
        description: args.description,
        category: args.category,
        price: args.price,
        stock: args.stock,
        images: args.images,
        user_id: Some(user),
    }
}

fn adjustment(change: StockChange) -> Result<StockAdjustment, StoreError> {
    if let Some(n) = change.add {
        return Ok(StockAdjustment::Add(n));
    }
    if let Some(n) = change.subtract {
        return Ok(StockAdjustment::Subtract(n));
    }
    let text = change.set.unwrap_or_default();
    Ok(StockAdjustment::Set(parse_stock(&text)?))
}

/// Refuse to touch products listed by someone else.
fn ensure_owner(
    state: &AppState,
    id: ProductId,
    user: UserId,
) -> Result<(), StoreError> {
    let owned = state
        .catalog()
        .get_by_id(id)
        .is_some_and(|product| product.owner() == Some(user));
    if owned {
        Ok(())
    } else {
        Err(StoreError::Validation(
            ValidationError::new("product", format!("product {id} is not one of your listings"))
                .into(),
        ))
    }
}

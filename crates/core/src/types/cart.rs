//! Cart line items and order receipts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::ProductId;
use super::price::Price;
use super::product::Product;

/// One product's entry in a cart.
///
/// `stock` is a snapshot taken at the last cart mutation and must be treated
/// as stale until revalidated against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: String,
    pub category: String,
    pub stock: u32,
    pub quantity: u32,
}

impl CartLineItem {
    /// Build a line item from a product, snapshotting its current stock.
    #[must_use]
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            image: product.primary_image().to_string(),
            category: product.category.clone(),
            stock: product.stock,
            quantity,
        }
    }

    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Receipt returned by a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub id: Uuid,
    /// Cart contents as they were before the cart was cleared.
    pub items: Vec<CartLineItem>,
    pub total: Price,
    pub timestamp: DateTime<Utc>,
}

impl OrderReceipt {
    /// Create a receipt for `items`, totalled in minor units.
    #[must_use]
    pub fn new(items: Vec<CartLineItem>) -> Self {
        let total = items.iter().map(CartLineItem::line_total).sum();
        Self {
            id: Uuid::new_v4(),
            items,
            total,
            timestamp: Utc::now(),
        }
    }
}

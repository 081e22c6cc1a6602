//! Cart store.
//!
//! Session-scoped line items checked against the catalog's current stock.
//! Every mutation is written through to the [`SessionStore`] under
//! [`keys::CART`]; [`CartStore::restore`] reads it back once at startup.
//!
//! Stock is always re-read from the [`CatalogStore`] right before it is used.
//! The snapshot kept on each line item is for display only.

mod checkout;

pub use checkout::{CheckoutError, CheckoutPhase};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bazaar_core::{CartLineItem, Price, Product, ProductId, ValidationError};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::catalog::CatalogStore;
use crate::error::add_breadcrumb;
use crate::session::{SessionStore, keys, load_json, save_json};
use crate::source::CatalogSource;

/// Errors from cart mutations. The cart is unchanged when one is returned.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Product {0} not found")]
    NotFound(ProductId),

    #[error("{name} is sold out")]
    OutOfStock { id: ProductId, name: String },

    #[error("Only {available} of {name} available ({requested} requested)")]
    InsufficientStock {
        id: ProductId,
        name: String,
        /// Total quantity the cart would have held.
        requested: u32,
        available: u32,
    },
}

/// Cart line items for one session.
pub struct CartStore<S> {
    catalog: Arc<CatalogStore<S>>,
    session: Arc<dyn SessionStore>,
    items: Mutex<Vec<CartLineItem>>,
    revision: watch::Sender<u64>,
}

impl<S> std::fmt::Debug for CartStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("items", &self.lock().len())
            .finish_non_exhaustive()
    }
}

impl<S> CartStore<S> {
    fn lock(&self) -> MutexGuard<'_, Vec<CartLineItem>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: CatalogSource> CartStore<S> {
    /// Create an empty cart. Call [`Self::restore`] to load a persisted one.
    #[must_use]
    pub fn new(catalog: Arc<CatalogStore<S>>, session: Arc<dyn SessionStore>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            catalog,
            session,
            items: Mutex::new(Vec::new()),
            revision,
        }
    }

    /// The catalog this cart checks stock against.
    #[must_use]
    pub fn catalog(&self) -> &Arc<CatalogStore<S>> {
        &self.catalog
    }

    /// Replace the in-memory cart with the persisted one.
    ///
    /// An unreadable persisted cart is logged and treated as empty.
    pub fn restore(&self) {
        let items = match load_json::<Vec<CartLineItem>>(self.session.as_ref(), keys::CART) {
            Ok(items) => items.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable persisted cart");
                Vec::new()
            }
        };
        debug!(count = items.len(), "Cart restored");
        *self.lock() = items;
        self.bump_revision();
    }

    /// Receiver notified after every cart change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump_revision(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    /// Persist `items` and notify subscribers. Persistence failures are logged.
    fn commit(&self, items: &[CartLineItem]) {
        if let Err(e) = save_json(self.session.as_ref(), keys::CART, items) {
            warn!(error = %e, "Failed to persist cart");
        }
        self.bump_revision();
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` of `product`, checked against current stock.
    ///
    /// Returns a message for the user on success. If the product is already in
    /// the cart the combined quantity must fit; otherwise nothing is added.
    ///
    /// # Errors
    ///
    /// Rejects a zero quantity, products missing from the catalog, sold-out
    /// products, and quantities above the current stock.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_to_cart(
        &self,
        product: &Product,
        quantity: u32,
    ) -> Result<String, CartError> {
        if quantity == 0 {
            return Err(ValidationError::new("quantity", "quantity must be at least 1").into());
        }
        let current = self
            .catalog
            .get_by_id(product.id)
            .ok_or(CartError::NotFound(product.id))?;
        if current.stock == 0 {
            return Err(CartError::OutOfStock {
                id: current.id,
                name: current.name,
            });
        }

        let mut items = self.lock();
        let in_cart = items
            .iter()
            .find(|item| item.id == current.id)
            .map_or(0, |item| item.quantity);
        let requested = in_cart.saturating_add(quantity);
        if requested > current.stock {
            return Err(CartError::InsufficientStock {
                id: current.id,
                name: current.name,
                requested,
                available: current.stock,
            });
        }

        let line = CartLineItem::from_product(&current, requested);
        match items.iter_mut().find(|item| item.id == current.id) {
            Some(slot) => *slot = line,
            None => items.push(line),
        }
        self.commit(&items);
        drop(items);

        let product_id = current.id.to_string();
        add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
        Ok(if quantity == 1 {
            format!("{} added to cart", current.name)
        } else {
            format!("{quantity} × {} added to cart", current.name)
        })
    }

    /// Set the quantity of a line item, clamped to current stock.
    ///
    /// `quantity <= 0` removes the line, as does a clamp down to zero. Does
    /// nothing if the product is not in the cart or not in the catalog.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn update_quantity(&self, id: ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove_from_cart(id);
            return;
        }
        let Some(current) = self.catalog.get_by_id(id) else {
            debug!("Product left the catalog, quantity unchanged");
            return;
        };
        let wanted = u32::try_from(quantity).unwrap_or(u32::MAX);
        let clamped = wanted.min(current.stock);
        if clamped == 0 {
            self.remove_from_cart(id);
            return;
        }

        let mut items = self.lock();
        let Some(slot) = items.iter_mut().find(|item| item.id == id) else {
            return;
        };
        if clamped < wanted {
            debug!(wanted, clamped, "Quantity clamped to stock");
        }
        *slot = CartLineItem::from_product(&current, clamped);
        self.commit(&items);
    }

    /// Remove a line item. Removing an absent item is a no-op.
    pub fn remove_from_cart(&self, id: ProductId) {
        let mut items = self.lock();
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() != before {
            self.commit(&items);
        }
    }

    /// Empty the cart.
    pub fn clear_cart(&self) {
        let mut items = self.lock();
        items.clear();
        self.commit(&items);
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Copy of the line items, in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<CartLineItem> {
        self.lock().clone()
    }

    /// Sum of quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.lock().iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of `price * quantity`, in minor units.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.lock().iter().map(CartLineItem::line_total).sum()
    }

    #[must_use]
    pub fn is_in_cart(&self, id: ProductId) -> bool {
        self.lock().iter().any(|item| item.id == id)
    }

    /// Quantity of `id` in the cart, 0 if absent.
    #[must_use]
    pub fn item_quantity(&self, id: ProductId) -> u32 {
        self.lock()
            .iter()
            .find(|item| item.id == id)
            .map_or(0, |item| item.quantity)
    }

    /// Describe every line item that current stock cannot cover.
    ///
    /// Empty when the whole cart can be fulfilled.
    #[must_use]
    pub fn validate_stock(&self) -> Vec<String> {
        stock_problems(&self.catalog, &self.items())
    }
}

fn stock_problems<S: CatalogSource>(
    catalog: &CatalogStore<S>,
    items: &[CartLineItem],
) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match catalog.stock_of(item.id) {
            None => Some(format!("{} is no longer available", item.name)),
            Some(0) => Some(format!("{} is sold out", item.name)),
            Some(stock) if item.quantity > stock => Some(format!(
                "{}: only {stock} left ({} in cart)",
                item.name, item.quantity
            )),
            Some(_) => None,
        })
        .collect()
}

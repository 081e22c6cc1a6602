//! Checkout: validate the whole cart, then debit stock item by item.
//!
//! ```text
//! Idle -> Validating -> Rejected
//!                    -> Debiting -> Cleared
//!                                -> PartiallyDebited
//! ```
//!
//! Debits run sequentially in cart order and stop at the first failure.
//! Debits already applied are not rolled back, and the cart is left as it was,
//! so a retry re-validates against the reduced stock and walks every item
//! again.

use std::fmt;

use bazaar_core::{OrderReceipt, ProductId};
use thiserror::Error;
use tracing::field::Empty;
use tracing::{Span, error, info, instrument, warn};

use super::{CartStore, stock_problems};
use crate::catalog::CatalogError;
use crate::error::add_breadcrumb;
use crate::source::CatalogSource;

/// Why a checkout did not complete.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to check out.
    #[error("Your cart is empty")]
    EmptyCart,

    /// Current stock cannot cover the cart; no stock was touched.
    #[error("Stock problems: {}", .0.join("; "))]
    StockConflict(Vec<String>),

    /// A debit failed after validation passed.
    ///
    /// Products in `applied` have already been debited remotely.
    #[error("Stock update for product {failed} failed after {} debit(s): {source}", .applied.len())]
    PartiallyDebited {
        applied: Vec<ProductId>,
        failed: ProductId,
        #[source]
        source: CatalogError,
    },
}

/// Checkout progress, recorded on the checkout span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutPhase {
    Idle,
    Validating,
    Rejected,
    Debiting,
    Cleared,
    PartiallyDebited,
}

impl CheckoutPhase {
    /// Whether checkout stops in this phase.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Cleared | Self::PartiallyDebited)
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Rejected => "rejected",
            Self::Debiting => "debiting",
            Self::Cleared => "cleared",
            Self::PartiallyDebited => "partially_debited",
        }
    }
}

impl fmt::Display for CheckoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn enter(phase: CheckoutPhase) {
    Span::current().record("phase", phase.as_str());
}

impl<S: CatalogSource> CartStore<S> {
    /// Check out the cart.
    ///
    /// On success the cart is cleared and a receipt for its former contents
    /// is returned.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::EmptyCart`] if there is nothing to buy
    /// - [`CheckoutError::StockConflict`] if any line fails validation; no
    ///   remote call is made
    /// - [`CheckoutError::PartiallyDebited`] if a debit fails; earlier debits
    ///   stay applied and the cart is unchanged
    #[instrument(skip(self), fields(phase = CheckoutPhase::Idle.as_str(), items = Empty))]
    pub async fn checkout(&self) -> Result<OrderReceipt, CheckoutError> {
        let items = self.items();
        Span::current().record("items", items.len());
        if items.is_empty() {
            enter(CheckoutPhase::Rejected);
            return Err(CheckoutError::EmptyCart);
        }

        enter(CheckoutPhase::Validating);
        let problems = stock_problems(&self.catalog, &items);
        if !problems.is_empty() {
            enter(CheckoutPhase::Rejected);
            warn!(problems = problems.len(), "Checkout rejected by stock validation");
            return Err(CheckoutError::StockConflict(problems));
        }

        enter(CheckoutPhase::Debiting);
        let mut applied = Vec::with_capacity(items.len());
        for item in &items {
            let debit = match self.catalog.stock_of(item.id) {
                Some(current) => {
                    let remaining = current.saturating_sub(item.quantity);
                    self.catalog
                        .update_stock(item.id, i64::from(remaining))
                        .await
                }
                None => Err(CatalogError::NotFound(item.id)),
            };

            if let Err(source) = debit {
                enter(CheckoutPhase::PartiallyDebited);
                error!(
                    product_id = %item.id,
                    applied = applied.len(),
                    error = %source,
                    "Checkout stopped part-way; applied debits were not rolled back"
                );
                return Err(CheckoutError::PartiallyDebited {
                    applied,
                    failed: item.id,
                    source,
                });
            }
            applied.push(item.id);
        }

        let receipt = OrderReceipt::new(items);
        self.clear_cart();
        enter(CheckoutPhase::Cleared);
        info!(order_id = %receipt.id, total = receipt.total.minor_units(), "Checkout complete");

        let order_id = receipt.id.to_string();
        add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order_id.as_str())]));
        Ok(receipt)
    }
}

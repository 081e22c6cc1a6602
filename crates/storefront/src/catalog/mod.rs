//! Catalog store.
//!
//! Holds the last fetched product and category lists, answers lookups and
//! searches from memory, and routes seller mutations through the
//! [`CatalogSource`]. The remote source stays the source of truth: nothing is
//! committed locally until the remote call has succeeded.
//!
//! # Concurrency
//!
//! State lives behind a `std::sync::RwLock` that is never held across an
//! `.await`. Every [`CatalogStore::load`] takes a ticket from a counter when it
//! starts, and every mutation takes one when it commits. A load's result is
//! committed only if nothing with a later ticket has committed already, so a
//! slow load that started before a stock debit cannot bring the old stock back.

mod aggregate;
mod search;

pub use aggregate::{collation_key, compare_names};
pub use search::{SearchOptions, SearchSort, result_categories};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bazaar_core::{
    Category, NewCategory, NewProduct, Product, ProductId, UserId, ValidationError,
    ValidationErrors, parse_stock_count, stock_from_i64, validate_new_product,
};
use chrono::Utc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::source::{CatalogSource, SourceError};

use aggregate::{recount_categories, sort_products};

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Input rejected before any remote call.
    #[error("Invalid product data: {0}")]
    Validation(#[from] ValidationErrors),

    /// The product exists neither locally nor remotely.
    #[error("Product {0} not found")]
    NotFound(ProductId),

    /// The data source failed; nothing from the failed call was committed.
    #[error("Catalog source failed: {0}")]
    Source(#[from] SourceError),
}

impl CatalogError {
    /// Whether the caller can fix this by changing its input.
    #[must_use]
    pub const fn is_user_correctable(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_))
    }

    fn from_lookup(id: ProductId, err: SourceError) -> Self {
        if err.is_not_found() {
            Self::NotFound(id)
        } else {
            Self::Source(err)
        }
    }
}

impl From<ValidationError> for CatalogError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.into())
    }
}

/// Where [`CatalogStore::get_by_id_remote`] found its product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOrigin {
    /// The in-memory catalog.
    Cache,
    /// A fresh fetch from the source.
    Remote,
}

/// Result of [`CatalogStore::get_by_id_remote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub product: Product,
    pub origin: LookupOrigin,
}

/// Seller stock edit, relative to the current stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAdjustment {
    Add(u32),
    /// Floors at zero.
    Subtract(u32),
    Set(u32),
}

impl StockAdjustment {
    /// The stock this adjustment produces from `current`.
    #[must_use]
    pub const fn apply(self, current: u32) -> u32 {
        match self {
            Self::Add(n) => current.saturating_add(n),
            Self::Subtract(n) => current.saturating_sub(n),
            Self::Set(n) => n,
        }
    }
}

/// Parse seller-typed stock text.
///
/// # Errors
///
/// Rejects blank, non-integer and negative input.
pub fn parse_stock(input: &str) -> Result<u32, CatalogError> {
    Ok(parse_stock_count(input)?)
}

/// Point-in-time copy of the catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct CatalogState {
    products: Vec<Product>,
    categories: Vec<Category>,
    pending_loads: usize,
    error: Option<String>,
    committed_ticket: u64,
}

impl CatalogState {
    fn resort_and_recount(&mut self) {
        sort_products(&mut self.products);
        recount_categories(&mut self.categories, &self.products);
    }
}

/// Keeps a load counted in `pending_loads` until it finishes or its future is
/// dropped mid-fetch.
struct PendingLoad<'a> {
    state: &'a RwLock<CatalogState>,
    armed: bool,
}

impl<'a> PendingLoad<'a> {
    fn start(state: &'a RwLock<CatalogState>) -> Self {
        state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .pending_loads += 1;
        Self { state, armed: true }
    }

    /// Uncount the load under a write lock the caller already holds.
    fn finish(mut self, state: &mut CatalogState) {
        state.pending_loads = state.pending_loads.saturating_sub(1);
        self.armed = false;
    }
}

impl Drop for PendingLoad<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.pending_loads = state.pending_loads.saturating_sub(1);
        }
    }
}

/// In-memory catalog backed by a [`CatalogSource`].
#[derive(Debug)]
pub struct CatalogStore<S> {
    source: Arc<S>,
    state: RwLock<CatalogState>,
    tickets: AtomicU64,
    revision: watch::Sender<u64>,
    suggestion_limit: usize,
}

impl<S: CatalogSource> CatalogStore<S> {
    /// Create an empty store over `source`.
    #[must_use]
    pub fn new(source: Arc<S>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            source,
            state: RwLock::new(CatalogState::default()),
            tickets: AtomicU64::new(0),
            revision,
            suggestion_limit: crate::config::DEFAULT_SUGGESTION_LIMIT,
        }
    }

    /// Set the cap used by [`Self::default_suggestions`].
    #[must_use]
    pub fn with_suggestion_limit(mut self, limit: usize) -> Self {
        self.suggestion_limit = limit;
        self
    }

    /// The underlying source.
    #[must_use]
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CatalogState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CatalogState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump_revision(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    fn next_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply a mutation the source has already accepted.
    ///
    /// The mutation takes a fresh ticket, so any load still in flight was
    /// started earlier and will be discarded.
    fn commit_mutation(&self, apply: impl FnOnce(&mut CatalogState)) {
        {
            let mut state = self.write_state();
            let ticket = self.next_ticket();
            apply(&mut *state);
            state.resort_and_recount();
            state.committed_ticket = state.committed_ticket.max(ticket);
        }
        self.bump_revision();
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Fetch products and categories and replace the catalog.
    ///
    /// Both lists are fetched concurrently and committed together. On failure
    /// the previous lists are kept and the error message is recorded.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Source`] if either fetch fails.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<(), CatalogError> {
        let ticket = self.next_ticket();
        let pending = PendingLoad::start(&self.state);
        debug!(ticket, "Loading catalog");

        let fetched = tokio::try_join!(self.source.list_products(), self.source.list_categories());

        let mut state = self.write_state();
        pending.finish(&mut *state);
        let current = ticket > state.committed_ticket;

        match fetched {
            Ok((products, categories)) => {
                if !current {
                    debug!(
                        ticket,
                        committed = state.committed_ticket,
                        "Discarding superseded catalog load"
                    );
                    return Ok(());
                }
                state.products = products;
                state.categories = categories;
                state.resort_and_recount();
                state.error = None;
                state.committed_ticket = ticket;
                info!(
                    ticket,
                    products = state.products.len(),
                    categories = state.categories.len(),
                    "Catalog loaded"
                );
                drop(state);
                self.bump_revision();
                Ok(())
            }
            Err(e) => {
                warn!(ticket, error = %e, "Catalog load failed");
                if current {
                    state.error = Some(e.to_string());
                    drop(state);
                    self.bump_revision();
                }
                Err(e.into())
            }
        }
    }

    /// Load only if nothing is loaded yet and no load is running.
    ///
    /// # Errors
    ///
    /// Returns the load error, if a load was started and failed.
    pub async fn ensure_loaded(&self) -> Result<(), CatalogError> {
        let needs_load = {
            let state = self.read_state();
            state.pending_loads == 0 && state.products.is_empty()
        };
        if needs_load {
            self.load().await?;
        }
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All products, sorted by name.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.read_state().products.clone()
    }

    /// All categories with their product counts.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        self.read_state().categories.clone()
    }

    /// Products, categories and load status in one consistent copy.
    #[must_use]
    pub fn snapshot(&self) -> CatalogSnapshot {
        let state = self.read_state();
        CatalogSnapshot {
            products: state.products.clone(),
            categories: state.categories.clone(),
            loading: state.pending_loads > 0,
            error: state.error.clone(),
        }
    }

    /// Whether a load is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.read_state().pending_loads > 0
    }

    /// Whether products are loaded and no load is in flight.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        let state = self.read_state();
        state.pending_loads == 0 && !state.products.is_empty()
    }

    /// Message of the last failed load, cleared by the next successful one.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.read_state().error.clone()
    }

    /// Receiver notified after every committed change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Product with `id`, from memory.
    #[must_use]
    pub fn get_by_id(&self, id: ProductId) -> Option<Product> {
        self.read_state()
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    /// Current stock of `id`, from memory.
    #[must_use]
    pub fn stock_of(&self, id: ProductId) -> Option<u32> {
        self.read_state()
            .products
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.stock)
    }

    /// Product with `id`, from memory or else fetched from the source.
    ///
    /// A fetched product is not added to the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the source does not have it
    /// either, or [`CatalogError::Source`] if the fetch fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_by_id_remote(&self, id: ProductId) -> Result<Lookup, CatalogError> {
        if let Some(product) = self.get_by_id(id) {
            return Ok(Lookup {
                product,
                origin: LookupOrigin::Cache,
            });
        }
        let product = self
            .source
            .get_product(id)
            .await
            .map_err(|e| CatalogError::from_lookup(id, e))?;
        Ok(Lookup {
            product,
            origin: LookupOrigin::Remote,
        })
    }

    /// Name/description search; a blank term returns every product.
    #[must_use]
    pub fn search_all(&self, term: &str) -> Vec<Product> {
        search::search_all(&self.read_state().products, term)
    }

    /// Inline suggestions over name, description and category.
    #[must_use]
    pub fn search_suggestions(&self, term: &str, limit: usize) -> Vec<Product> {
        search::search_suggestions(&self.read_state().products, term, limit)
    }

    /// [`Self::search_suggestions`] with the configured limit.
    #[must_use]
    pub fn default_suggestions(&self, term: &str) -> Vec<Product> {
        self.search_suggestions(term, self.suggestion_limit)
    }

    /// Search page results.
    #[must_use]
    pub fn search_results(&self, term: &str, options: &SearchOptions) -> Vec<Product> {
        search::search_results(&self.read_state().products, term, options)
    }

    /// Products whose category is exactly `category`.
    #[must_use]
    pub fn filter_by_category(&self, category: &str) -> Vec<Product> {
        self.read_state()
            .products
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect()
    }

    /// Products listed by `user`.
    #[must_use]
    pub fn products_by_owner(&self, user: UserId) -> Vec<Product> {
        self.read_state()
            .products
            .iter()
            .filter(|p| p.owner() == Some(user))
            .cloned()
            .collect()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Validate and create a product, creating its category if it is new.
    ///
    /// The category is created first and committed locally as soon as the
    /// source accepts it, so a retry after a failed product creation reuses it
    /// instead of creating a second category with the same name.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any remote call, or the source error
    /// of the first remote call that failed.
    #[instrument(skip(self, product), fields(name = %product.name, category = %product.category))]
    pub async fn create_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        validate_new_product(&product)?;

        let mut payload = product;
        payload.created_at.get_or_insert_with(Utc::now);

        let category_known = self
            .read_state()
            .categories
            .iter()
            .any(|c| c.name == payload.category);
        if !category_known {
            let category = self
                .source
                .create_category(&NewCategory::named(&payload.category, 0))
                .await?;
            info!(category = %category.name, "Category created");
            self.commit_mutation(|state| {
                if !state.categories.iter().any(|c| c.name == category.name) {
                    state.categories.push(category);
                }
            });
        }

        let created = self.source.create_product(&payload).await?;
        info!(product_id = %created.id, "Product created");

        self.commit_mutation(|state| state.products.push(created.clone()));
        Ok(created)
    }

    /// Set the stock of `id` to `new_stock`.
    ///
    /// Fetches the full record, replaces its stock and writes it back.
    ///
    /// # Errors
    ///
    /// Negative or out-of-range stock is rejected before any remote call.
    /// Returns [`CatalogError::NotFound`] if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn update_stock(&self, id: ProductId, new_stock: i64) -> Result<Product, CatalogError> {
        let stock = stock_from_i64(new_stock)?;

        let mut record = self
            .source
            .get_product(id)
            .await
            .map_err(|e| CatalogError::from_lookup(id, e))?;
        let previous = record.stock;
        record.stock = stock;

        let saved = self
            .source
            .update_product(id, &record)
            .await
            .map_err(|e| CatalogError::from_lookup(id, e))?;
        info!(previous, stock = saved.stock, "Stock updated");

        self.commit_mutation(|state| {
            match state.products.iter_mut().find(|p| p.id == id) {
                Some(slot) => *slot = saved.clone(),
                None => state.products.push(saved.clone()),
            }
        });
        Ok(saved)
    }

    /// Apply a relative stock edit to the product's current stock.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the product is not in the catalog,
    /// otherwise whatever [`Self::update_stock`] returns.
    pub async fn adjust_stock(
        &self,
        id: ProductId,
        adjustment: StockAdjustment,
    ) -> Result<Product, CatalogError> {
        let current = self.stock_of(id).ok_or(CatalogError::NotFound(id))?;
        let target = adjustment.apply(current);
        self.update_stock(id, i64::from(target)).await
    }

    /// Delete a product remotely, then locally.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the source does not have it, or
    /// the source error.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError> {
        self.source
            .delete_product(id)
            .await
            .map_err(|e| CatalogError::from_lookup(id, e))?;
        info!("Product deleted");

        self.commit_mutation(|state| state.products.retain(|p| p.id != id));
        Ok(())
    }
}

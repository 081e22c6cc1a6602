//! Integration test support for Bazaar.
//!
//! [`ScriptedSource`] wraps a [`MemorySource`] and adds what the scenarios
//! need from a remote API: a log of every call, injected failures, and gates
//! that hold a `list_products` response until the test releases it.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bazaar_core::{Category, NewCategory, NewProduct, Product, ProductId};
use bazaar_storefront::source::{CatalogSource, MemorySource, SeedData, SourceError};
use tokio::sync::Notify;

/// A call made against the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListProducts,
    ListCategories,
    GetProduct(ProductId),
    CreateProduct(String),
    UpdateProduct(ProductId),
    DeleteProduct(ProductId),
    CreateCategory(String),
}

/// Catalog source with call recording and fault injection.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    inner: MemorySource,
    calls: Mutex<Vec<Call>>,
    failing_updates: Mutex<HashSet<ProductId>>,
    failing_lists: AtomicBool,
    failing_product_creates: AtomicBool,
    failing_category_creates: AtomicBool,
    failing_deletes: AtomicBool,
    list_gates: Mutex<VecDeque<Arc<Notify>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn unavailable() -> SourceError {
    SourceError::Status {
        status: 503,
        message: "injected failure".to_string(),
    }
}

impl ScriptedSource {
    #[must_use]
    pub fn new(seed: SeedData) -> Self {
        Self {
            inner: MemorySource::new(seed),
            ..Self::default()
        }
    }

    /// Build from `db.json`-shaped JSON.
    ///
    /// # Panics
    ///
    /// Panics if `json` is not valid seed data.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn from_json(json: serde_json::Value) -> Self {
        Self::new(serde_json::from_value(json).expect("valid seed JSON"))
    }

    /// Make every `update_product` for `id` fail with a 503.
    pub fn fail_updates_for(&self, id: ProductId) {
        lock(&self.failing_updates).insert(id);
    }

    /// Make `list_products` and `list_categories` fail (or stop failing).
    pub fn fail_lists(&self, failing: bool) {
        self.failing_lists.store(failing, Ordering::SeqCst);
    }

    /// Make `create_product` fail (or stop failing).
    pub fn fail_creates(&self, failing: bool) {
        self.failing_product_creates.store(failing, Ordering::SeqCst);
    }

    /// Make `create_category` fail (or stop failing).
    pub fn fail_category_creates(&self, failing: bool) {
        self.failing_category_creates.store(failing, Ordering::SeqCst);
    }

    /// Make `delete_product` fail (or stop failing).
    pub fn fail_deletes(&self, failing: bool) {
        self.failing_deletes.store(failing, Ordering::SeqCst);
    }

    /// Hold the next `list_products` response until the returned gate is
    /// notified. The response reflects the data at the time of the call.
    #[must_use]
    pub fn hold_next_list(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        lock(&self.list_gates).push_back(Arc::clone(&gate));
        gate
    }

    /// Every call so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    /// Products passed to `update_product`, in order.
    #[must_use]
    pub fn update_calls(&self) -> Vec<ProductId> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                Call::UpdateProduct(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Forget recorded calls.
    pub fn reset_calls(&self) {
        lock(&self.calls).clear();
    }

    /// Remote stock of `id`.
    #[must_use]
    pub fn stock_of(&self, id: ProductId) -> Option<u32> {
        self.inner.stock_of(id)
    }

    /// Change remote data behind the store's back.
    pub async fn remote_set_stock(&self, id: ProductId, stock: u32) {
        if let Ok(mut product) = self.inner.get_product(id).await {
            product.stock = stock;
            let _ = self.inner.update_product(id, &product).await;
        }
    }

    /// Rename a product behind the store's back.
    pub async fn remote_rename(&self, id: ProductId, name: &str) {
        if let Ok(mut product) = self.inner.get_product(id).await {
            product.name = name.to_string();
            let _ = self.inner.update_product(id, &product).await;
        }
    }

    fn record(&self, call: Call) {
        lock(&self.calls).push(call);
    }
}

impl CatalogSource for ScriptedSource {
    async fn list_products(&self) -> Result<Vec<Product>, SourceError> {
        self.record(Call::ListProducts);
        if self.failing_lists.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let products = self.inner.list_products().await?;
        let gate = lock(&self.list_gates).pop_front();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(products)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, SourceError> {
        self.record(Call::ListCategories);
        if self.failing_lists.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.list_categories().await
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, SourceError> {
        self.record(Call::GetProduct(id));
        self.inner.get_product(id).await
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, SourceError> {
        self.record(Call::CreateProduct(product.name.clone()));
        if self.failing_product_creates.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.create_product(product).await
    }

    async fn update_product(&self, id: ProductId, product: &Product) -> Result<Product, SourceError> {
        self.record(Call::UpdateProduct(id));
        if lock(&self.failing_updates).contains(&id) {
            return Err(unavailable());
        }
        self.inner.update_product(id, product).await
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), SourceError> {
        self.record(Call::DeleteProduct(id));
        if self.failing_deletes.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.delete_product(id).await
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category, SourceError> {
        self.record(Call::CreateCategory(category.name.clone()));
        if self.failing_category_creates.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.create_category(category).await
    }
}

/// A small catalog shared by the scenarios.
#[must_use]
pub fn sample_seed() -> serde_json::Value {
    serde_json::json!({
        "products": [
            {"id": 1, "name": "yerba mate", "description": "Molienda gruesa, sin palo",
             "category": "Almacén", "price": 3250, "stock": 3, "userId": 10},
            {"id": "2", "name": "Termo", "description": "Acero inoxidable, un litro",
             "category": "Hogar", "price": 25000, "stock": 5, "createdBy": "10"},
            {"id": 3, "name": "Ñandú de peluche", "description": "Juguete suave",
             "category": "Juguetes", "price": 8990, "stock": 0},
            {"id": 4, "name": "Azúcar", "description": "Un kilo",
             "category": "Almacén", "price": 1199, "stock": 12, "userId": 11},
            {"id": 5, "name": "Bombilla", "description": "Alpaca, para mate",
             "category": "Hogar", "price": 4000, "stock": 7}
        ],
        "categories": [
            {"id": 1, "name": "Almacén", "productCount": 99},
            {"id": 2, "name": "Hogar"},
            {"id": 3, "name": "Juguetes"},
            {"id": 4, "name": "Ropa"}
        ]
    })
}

//! In-process catalog source.
//!
//! Holds products and categories in memory, optionally backed by a JSON file
//! in the `json-server` `db.json` shape (`{"products": [...], "categories": [...]}`).
//! When backed, every mutation is written through to the file.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bazaar_core::{Category, CategoryId, NewCategory, NewProduct, Product, ProductId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{CatalogSource, SourceError};

/// Contents of a seed file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// Catalog source living in process memory.
#[derive(Debug, Default)]
pub struct MemorySource {
    data: Mutex<SeedData>,
    backing_file: Option<PathBuf>,
}

impl MemorySource {
    /// Create a source holding `seed`, with no backing file.
    #[must_use]
    pub fn new(seed: SeedData) -> Self {
        Self {
            data: Mutex::new(seed),
            backing_file: None,
        }
    }

    /// Load a seed file and write mutations back to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid seed JSON.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let seed: SeedData = serde_json::from_str(&contents)?;
        debug!(
            path = %path.display(),
            products = seed.products.len(),
            categories = seed.categories.len(),
            "Loaded seed file"
        );
        Ok(Self {
            data: Mutex::new(seed),
            backing_file: Some(path.to_path_buf()),
        })
    }

    /// Copy of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> SeedData {
        self.lock().clone()
    }

    /// Current stock of a product, if it exists.
    #[must_use]
    pub fn stock_of(&self, id: ProductId) -> Option<u32> {
        self.lock().products.iter().find(|p| p.id == id).map(|p| p.stock)
    }

    fn lock(&self) -> MutexGuard<'_, SeedData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write the data to the backing file, if any.
    fn persist(&self, data: &SeedData) -> Result<(), SourceError> {
        let Some(path) = &self.backing_file else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(data)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

fn next_product_id(products: &[Product]) -> ProductId {
    ProductId::new(products.iter().map(|p| p.id.as_i64()).max().unwrap_or(0) + 1)
}

fn next_category_id(categories: &[Category]) -> CategoryId {
    CategoryId::new(categories.iter().map(|c| c.id.as_i64()).max().unwrap_or(0) + 1)
}

impl CatalogSource for MemorySource {
    async fn list_products(&self) -> Result<Vec<Product>, SourceError> {
        Ok(self.lock().products.clone())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, SourceError> {
        Ok(self.lock().categories.clone())
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, SourceError> {
        self.lock()
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("product {id}")))
    }

    #[instrument(skip(self, product), fields(name = %product.name))]
    async fn create_product(&self, product: &NewProduct) -> Result<Product, SourceError> {
        let mut data = self.lock();
        let created = Product {
            id: next_product_id(&data.products),
            name: product.name.clone(),
            description: product.description.clone(),
            category: product.category.clone(),
            price: product.price,
            stock: product.stock,
            images: product.images.clone(),
            image: None,
            created_at: Some(product.created_at.unwrap_or_else(Utc::now)),
            user_id: product.user_id,
            created_by: product.user_id,
        };
        data.products.push(created.clone());
        self.persist(&data)?;
        Ok(created)
    }

    #[instrument(skip(self, product), fields(product_id = %id))]
    async fn update_product(&self, id: ProductId, product: &Product) -> Result<Product, SourceError> {
        let mut data = self.lock();
        let slot = data
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| SourceError::NotFound(format!("product {id}")))?;
        *slot = Product {
            id,
            ..product.clone()
        };
        let updated = slot.clone();
        self.persist(&data)?;
        Ok(updated)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete_product(&self, id: ProductId) -> Result<(), SourceError> {
        let mut data = self.lock();
        let before = data.products.len();
        data.products.retain(|p| p.id != id);
        if data.products.len() == before {
            return Err(SourceError::NotFound(format!("product {id}")));
        }
        self.persist(&data)
    }

    #[instrument(skip(self, category), fields(name = %category.name))]
    async fn create_category(&self, category: &NewCategory) -> Result<Category, SourceError> {
        let mut data = self.lock();
        let created = Category {
            id: next_category_id(&data.categories),
            name: category.name.clone(),
            description: category.description.clone(),
            icon: category.icon.clone(),
            product_count: category.product_count,
        };
        data.categories.push(created.clone());
        self.persist(&data)?;
        Ok(created)
    }
}

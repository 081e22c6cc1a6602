//! Source selected at startup from configuration.

use bazaar_core::{Category, NewCategory, NewProduct, Product, ProductId};
use tracing::info;

use super::{CatalogSource, MemorySource, RestSource, SourceError};
use crate::config::StorefrontConfig;

/// Either the REST API or a local seed file.
pub enum ConfiguredSource {
    Rest(RestSource),
    Memory(MemorySource),
}

impl ConfiguredSource {
    /// Use the seed file if one is configured, otherwise the REST API.
    ///
    /// # Errors
    ///
    /// Returns an error if the seed file cannot be loaded or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, SourceError> {
        if let Some(path) = &config.seed_path {
            info!(path = %path.display(), "Using local seed file");
            return Ok(Self::Memory(MemorySource::open(path)?));
        }
        info!(base_url = %config.api.base_url, "Using catalog API");
        Ok(Self::Rest(RestSource::new(&config.api)?))
    }

    /// Short label for logs and status output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Rest(_) => "rest",
            Self::Memory(_) => "seed",
        }
    }
}

impl From<RestSource> for ConfiguredSource {
    fn from(source: RestSource) -> Self {
        Self::Rest(source)
    }
}

impl From<MemorySource> for ConfiguredSource {
    fn from(source: MemorySource) -> Self {
        Self::Memory(source)
    }
}

impl CatalogSource for ConfiguredSource {
    async fn list_products(&self) -> Result<Vec<Product>, SourceError> {
        match self {
            Self::Rest(s) => s.list_products().await,
            Self::Memory(s) => s.list_products().await,
        }
    }

    async fn list_categories(&self) -> Result<Vec<Category>, SourceError> {
        match self {
            Self::Rest(s) => s.list_categories().await,
            Self::Memory(s) => s.list_categories().await,
        }
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, SourceError> {
        match self {
            Self::Rest(s) => s.get_product(id).await,
            Self::Memory(s) => s.get_product(id).await,
        }
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, SourceError> {
        match self {
            Self::Rest(s) => s.create_product(product).await,
            Self::Memory(s) => s.create_product(product).await,
        }
    }

    async fn update_product(&self, id: ProductId, product: &Product) -> Result<Product, SourceError> {
        match self {
            Self::Rest(s) => s.update_product(id, product).await,
            Self::Memory(s) => s.update_product(id, product).await,
        }
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), SourceError> {
        match self {
            Self::Rest(s) => s.delete_product(id).await,
            Self::Memory(s) => s.delete_product(id).await,
        }
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category, SourceError> {
        match self {
            Self::Rest(s) => s.create_category(category).await,
            Self::Memory(s) => s.create_category(category).await,
        }
    }
}

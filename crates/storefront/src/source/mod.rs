//! Catalog data sources.
//!
//! # Architecture
//!
//! - [`CatalogSource`] is the boundary contract the stores consume
//! - The remote data API is the source of truth; the stores keep only the
//!   last fetched lists in memory
//! - Ids, prices and stock are converted into `bazaar_core` types on
//!   ingestion, once
//!
//! # Implementations
//!
//! - [`RestSource`] - REST resource server (`json-server` or the Spring
//!   service) over `reqwest`
//! - [`MemorySource`] - in-process store seeded from a `db.json`-shaped file,
//!   for offline use and tests
//! - [`ConfiguredSource`] - whichever of the two the configuration selects

mod configured;
mod memory;
mod rest;

pub use configured::ConfiguredSource;
pub use memory::{MemorySource, SeedData};
pub use rest::RestSource;

use std::future::Future;

use bazaar_core::{Category, NewCategory, NewProduct, Product, ProductId};
use thiserror::Error;

/// Errors that can occur when talking to a catalog data source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Seed file could not be read.
    #[error("Seed file error: {0}")]
    Seed(#[from] std::io::Error),
}

impl SourceError {
    /// Whether the error means the resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Remote product and category storage.
///
/// All operations are asynchronous and fallible. `update_product` replaces the
/// full record; stock changes are done as read-then-write by the caller.
pub trait CatalogSource: Send + Sync {
    /// List every product.
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, SourceError>> + Send;

    /// List every category.
    fn list_categories(&self) -> impl Future<Output = Result<Vec<Category>, SourceError>> + Send;

    /// Fetch one product. Missing products yield [`SourceError::NotFound`].
    fn get_product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Product, SourceError>> + Send;

    /// Create a product and return the stored record (with its new id).
    fn create_product(
        &self,
        product: &NewProduct,
    ) -> impl Future<Output = Result<Product, SourceError>> + Send;

    /// Replace a product record.
    fn update_product(
        &self,
        id: ProductId,
        product: &Product,
    ) -> impl Future<Output = Result<Product, SourceError>> + Send;

    /// Delete a product.
    fn delete_product(&self, id: ProductId) -> impl Future<Output = Result<(), SourceError>> + Send;

    /// Create a category and return the stored record.
    fn create_category(
        &self,
        category: &NewCategory,
    ) -> impl Future<Output = Result<Category, SourceError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_display() {
        let err = SourceError::NotFound("product 12".to_string());
        assert_eq!(err.to_string(), "Not found: product 12");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_status_error_display() {
        let err = SourceError::Status {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API returned 500: boom");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_rate_limited_error() {
        let err = SourceError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}

//! Catalog records: products and categories.
//!
//! Field names follow the REST resource shape (`camelCase`). Products point at
//! their category by name, not by id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId, UserId, deserialize_owner};
use super::lenient::deserialize_u32;
use super::price::Price;
use super::status::StockLevel;

/// Image shown when a product has none.
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.png";

/// A product as held by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub price: Price,
    /// Authoritative available quantity.
    #[serde(deserialize_with = "deserialize_u32")]
    pub stock: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Single-image field used by older records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "deserialize_owner",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<UserId>,
    #[serde(
        default,
        deserialize_with = "deserialize_owner",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_by: Option<UserId>,
}

impl Product {
    /// First image, else the legacy image, else the placeholder.
    #[must_use]
    pub fn primary_image(&self) -> &str {
        self.images
            .first()
            .or(self.image.as_ref())
            .map_or(PLACEHOLDER_IMAGE, String::as_str)
    }

    /// Owning seller. `userId` wins over `createdBy` when both are set.
    #[must_use]
    pub const fn owner(&self) -> Option<UserId> {
        match self.user_id {
            Some(id) => Some(id),
            None => self.created_by,
        }
    }

    /// Availability badge for the current stock.
    #[must_use]
    pub const fn stock_level(&self) -> StockLevel {
        StockLevel::from_stock(self.stock)
    }
}

/// A product listing to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Price,
    pub stock: u32,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    /// Unique key that products reference.
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Derived by the catalog; whatever the source sends is overwritten.
    #[serde(default)]
    pub product_count: usize,
}

/// A category to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub product_count: usize,
}

impl NewCategory {
    /// Category created on the fly for a new listing.
    #[must_use]
    pub fn named(name: &str, product_count: usize) -> Self {
        Self {
            name: name.to_string(),
            description: format!("Productos de {name}"),
            icon: None,
            product_count,
        }
    }
}

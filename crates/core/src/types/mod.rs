//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers and records for the storefront domain.

pub mod cart;
pub mod id;
pub mod lenient;
pub mod listing;
pub mod price;
pub mod product;
pub mod status;
pub mod user;

pub use cart::{CartLineItem, OrderReceipt};
pub use id::*;
pub use listing::{
    ListingDraft, MIN_DESCRIPTION_CHARS, ValidationError, ValidationErrors, parse_stock_count,
    stock_from_i64, validate_new_product,
};
pub use price::{CurrencyCode, Price, PriceParseError};
pub use product::{Category, NewCategory, NewProduct, PLACEHOLDER_IMAGE, Product};
pub use status::{LOW_STOCK_THRESHOLD, StockLevel};
pub use user::SessionUser;

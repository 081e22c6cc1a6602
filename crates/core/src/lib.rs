//! Bazaar Core - Shared domain types.
//!
//! This crate provides the types used across all Bazaar components:
//! - `storefront` - Catalog and cart stores, data sources, session persistence
//! - `cli` - Command-line front end over the stores
//!
//! # Architecture
//!
//! The core crate contains only types and pure validation - no I/O, no HTTP
//! clients, no persistence. Everything crossing the data-source boundary is
//! converted into these types exactly once, on ingestion.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, integer prices, products, categories, cart
//!   line items, order receipts, listing drafts, and the session user

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

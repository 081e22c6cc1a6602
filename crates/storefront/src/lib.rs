//! Bazaar storefront library.
//!
//! The catalog and cart stores, their data sources and session persistence,
//! kept free of any front end so they can be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod session;
pub mod source;
pub mod state;

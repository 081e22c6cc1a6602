//! Durable session persistence.
//!
//! A string key-value store with browser `localStorage` semantics: read once
//! at startup, written through on every change. The cart and the logged-in
//! user are stored as JSON under [`keys::CART`] and [`keys::USER`].

mod file;

pub use file::FileSessionStore;

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use bazaar_core::SessionUser;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Session keys.
pub mod keys {
    /// Key for the serialized cart line items.
    pub const CART: &str = "cart";

    /// Key for the logged-in user.
    pub const USER: &str = "user";
}

/// Errors from the session store.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading or writing the backing file failed.
    #[error("Session I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data is not valid JSON for the expected type.
    #[error("Session data error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Durable string key-value storage.
pub trait SessionStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Write a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;

    /// Delete a value. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

/// Read and deserialize a JSON value.
///
/// # Errors
///
/// Returns an error if the store fails or the value is not valid JSON for `T`.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn SessionStore,
    key: &str,
) -> Result<Option<T>, SessionError> {
    store
        .get(key)?
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(SessionError::from)
}

/// Serialize and write a JSON value.
///
/// # Errors
///
/// Returns an error if serialization or the store fails.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn SessionStore,
    key: &str,
    value: &T,
) -> Result<(), SessionError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// The persisted logged-in user, if any.
///
/// # Errors
///
/// Returns an error if the stored user cannot be read.
pub fn current_user(store: &dyn SessionStore) -> Result<Option<SessionUser>, SessionError> {
    load_json(store, keys::USER)
}

/// Persist `user` as the logged-in user.
///
/// # Errors
///
/// Returns an error if the user cannot be written.
pub fn save_user(store: &dyn SessionStore, user: &SessionUser) -> Result<(), SessionError> {
    save_json(store, keys::USER, user)?;
    crate::error::set_sentry_user(&user.id, Some(&user.email));
    Ok(())
}

/// Forget the logged-in user.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub fn clear_user(store: &dyn SessionStore) -> Result<(), SessionError> {
    store.remove(keys::USER)?;
    crate::error::clear_sentry_user();
    Ok(())
}

/// Session store held in memory only.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

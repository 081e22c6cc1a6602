//! Unified error handling with Sentry integration.
//!
//! Each layer has its own error enum ([`SourceError`], [`CatalogError`],
//! [`CartError`], [`CheckoutError`], [`SessionError`], [`ConfigError`]).
//! Front ends convert them into [`StoreError`], which decides what gets
//! reported to Sentry and what the user is told.

use bazaar_core::ValidationErrors;
use thiserror::Error;

use crate::cart::{CartError, CheckoutError};
use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::session::SessionError;
use crate::source::SourceError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Data source operation failed outside a store.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Cart mutation was rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout did not complete.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Session persistence failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Input was rejected before anything was sent.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationErrors),
}

impl StoreError {
    /// Whether some remote state changed even though the operation failed.
    #[must_use]
    pub const fn is_partial_failure(&self) -> bool {
        matches!(self, Self::Checkout(CheckoutError::PartiallyDebited { .. }))
    }

    /// Whether the user can fix this by changing their input or cart.
    #[must_use]
    pub const fn is_user_correctable(&self) -> bool {
        match self {
            Self::Cart(_) | Self::Validation(_) => true,
            Self::Catalog(err) => err.is_user_correctable(),
            Self::Checkout(err) => !matches!(err, CheckoutError::PartiallyDebited { .. }),
            Self::Config(_) | Self::Source(_) | Self::Session(_) => false,
        }
    }

    /// Log the error and capture it to Sentry if it is not user-correctable.
    ///
    /// Returns the Sentry event id when one was captured.
    pub fn report(&self) -> Option<sentry::types::Uuid> {
        if self.is_user_correctable() {
            tracing::info!(error = %self, "Operation rejected");
            return None;
        }

        let event_id = sentry::capture_error(self);
        tracing::error!(
            error = %self,
            partial_failure = self.is_partial_failure(),
            sentry_event_id = %event_id,
            "Operation failed"
        );
        Some(event_id)
    }

    /// Message safe to show to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(_) => "The storefront is misconfigured".to_string(),
            Self::Source(_) | Self::Catalog(CatalogError::Source(_)) => {
                "The store could not be reached, please try again".to_string()
            }
            Self::Session(_) => "Your session could not be saved".to_string(),
            Self::Checkout(CheckoutError::PartiallyDebited { applied, .. }) if applied.is_empty() => {
                "Checkout failed before any stock was taken, please try again".to_string()
            }
            Self::Checkout(CheckoutError::PartiallyDebited { applied, .. }) => format!(
                "Checkout failed part-way: stock was already taken for {} item(s). \
                 Some items may have been affected; review your cart before retrying.",
                applied.len()
            ),
            Self::Checkout(CheckoutError::StockConflict(problems)) => {
                format!("Stock problems found:\n{}", problems.join("\n"))
            }
            Self::Cart(err) => err.to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::Catalog(err) => err.to_string(),
            Self::Validation(err) => err.to_string(),
        }
    }
}

/// Result type alias for `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after a user session is restored or saved.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of cart and
/// catalog actions leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

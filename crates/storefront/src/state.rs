//! Application state owned by the front end.

use std::sync::Arc;

use bazaar_core::SessionUser;

use crate::cart::CartStore;
use crate::catalog::{CatalogError, CatalogStore};
use crate::config::StorefrontConfig;
use crate::error::{Result, StoreError, set_sentry_user};
use crate::session::{self, FileSessionStore, SessionStore};
use crate::source::ConfiguredSource;

/// Stores and session shared by every part of the front end.
///
/// Cheaply cloneable via `Arc`. Build with [`AppState::new`], then call
/// [`AppState::start`] once.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Arc<CatalogStore<ConfiguredSource>>,
    cart: CartStore<ConfiguredSource>,
    session: Arc<dyn SessionStore>,
}

impl AppState {
    /// Create the state described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog source or the session file cannot be
    /// opened.
    pub fn new(config: StorefrontConfig) -> Result<Self> {
        let source = ConfiguredSource::from_config(&config)?;
        let session = Arc::new(FileSessionStore::open(&config.session_path)?);
        Ok(Self::with_parts(config, source, session))
    }

    /// Create the state from an explicit source and session store.
    #[must_use]
    pub fn with_parts(
        config: StorefrontConfig,
        source: ConfiguredSource,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        let catalog = Arc::new(
            CatalogStore::new(Arc::new(source)).with_suggestion_limit(config.suggestion_limit),
        );
        let cart = CartStore::new(Arc::clone(&catalog), Arc::clone(&session));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                cart,
                session,
            }),
        }
    }

    /// Restore the session and load the catalog.
    ///
    /// The cart is restored even if the load fails.
    ///
    /// # Errors
    ///
    /// Returns the catalog load error.
    pub async fn start(&self) -> std::result::Result<(), CatalogError> {
        self.inner.cart.restore();
        match self.current_user() {
            Ok(Some(user)) => set_sentry_user(&user.id, Some(&user.email)),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Ignoring unreadable session user"),
        }
        self.inner.catalog.load().await
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog store.
    #[must_use]
    pub fn catalog(&self) -> &CatalogStore<ConfiguredSource> {
        &self.inner.catalog
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore<ConfiguredSource> {
        &self.inner.cart
    }

    /// The logged-in user, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub fn current_user(&self) -> Result<Option<SessionUser>> {
        Ok(session::current_user(self.inner.session.as_ref())?)
    }

    /// Record `user` as logged in.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub fn login(&self, user: &SessionUser) -> Result<()> {
        session::save_user(self.inner.session.as_ref(), user).map_err(StoreError::from)
    }

    /// Forget the logged-in user. The cart is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub fn logout(&self) -> Result<()> {
        session::clear_user(self.inner.session.as_ref()).map_err(StoreError::from)
    }
}

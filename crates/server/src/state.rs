//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::{AccountStore, CartStore, ProductStore, Stores};
use crate::services::{
    AccountService, AuthService, CartService, CatalogFeed, CatalogService, TokenKeys,
};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and hands out the stores and
/// per-request services.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    stores: Stores,
    feed: CatalogFeed,
    tokens: TokenKeys,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ServerConfig, stores: Stores) -> Self {
        let tokens = TokenKeys::new(&config.jwt_secret);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                stores,
                feed: CatalogFeed::new(),
                tokens,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn products(&self) -> &dyn ProductStore {
        self.inner.stores.products.as_ref()
    }

    #[must_use]
    pub fn carts(&self) -> &dyn CartStore {
        self.inner.stores.carts.as_ref()
    }

    #[must_use]
    pub fn accounts(&self) -> &dyn AccountStore {
        self.inner.stores.accounts.as_ref()
    }

    /// The realtime catalog feed.
    #[must_use]
    pub fn feed(&self) -> &CatalogFeed {
        &self.inner.feed
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenKeys {
        &self.inner.tokens
    }

    // =========================================================================
    // Services
    // =========================================================================

    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(self.products(), self.feed())
    }

    #[must_use]
    pub fn cart_service(&self) -> CartService<'_> {
        CartService::new(self.carts(), self.products())
    }

    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.accounts(), self.carts(), self.tokens())
    }

    #[must_use]
    pub fn account_service(&self) -> AccountService<'_> {
        AccountService::new(self.accounts())
    }
}

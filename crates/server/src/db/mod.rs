//! Persistence for products, carts and accounts.
//!
//! Each store is a trait with two implementations:
//!
//! - `PostgreSQL` ([`PgProductStore`], [`PgCartStore`], [`PgAccountStore`])
//! - in-memory ([`MemoryStore`]), used by tests and `EMPORIUM_STORE=memory`
//!
//! ## Tables
//!
//! - `emporium.product` - Catalog
//! - `emporium.cart` / `emporium.cart_item` - Carts and their line items
//! - `emporium.account` - Accounts with argon2 password hashes
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! `cart_item.product_id` deliberately has no foreign key: deleting a product
//! leaves dangling line items, which resolve to `null` when a cart is read.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p emporium-cli -- migrate
//! ```

pub mod accounts;
pub mod carts;
pub mod memory;
pub mod products;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use emporium_core::{
    AccountId, Cart, CartId, Email, LineItem, NewProduct, Page, Product, ProductId, ProductQuery,
    ProductUpdate, Quantity,
};

use crate::models::{Account, AccountUpdate, NewAccount};

pub use accounts::PgAccountStore;
pub use carts::PgCartStore;
pub use memory::MemoryStore;
pub use products::PgProductStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique violation to [`RepositoryError::Conflict`].
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Catalog persistence.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn create(&self, input: NewProduct) -> Result<Product, RepositoryError>;

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// The products among `ids` that exist, in no particular order.
    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    /// One page of the filtered, sorted catalog.
    async fn list(&self, query: &ProductQuery) -> Result<Page<Product>, RepositoryError>;

    /// The whole catalog in insertion order.
    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Apply a validated update. `None` if the product does not exist.
    async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Delete a product. `false` if it did not exist.
    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError>;

    /// Cheap connectivity probe for readiness checks.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Cart persistence.
///
/// Line-item mutations return `None` when the cart does not exist.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn create(&self) -> Result<Cart, RepositoryError>;

    async fn get(&self, id: CartId) -> Result<Option<Cart>, RepositoryError>;

    /// Atomically add `quantity` to a line item, inserting it when absent.
    async fn add_line_item(
        &self,
        id: CartId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<Option<Cart>, RepositoryError>;

    /// Overwrite an existing line item's quantity.
    ///
    /// Returns `Ok(Some(false))` if the cart exists but the product is not in it.
    async fn set_quantity(
        &self,
        id: CartId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<Option<bool>, RepositoryError>;

    /// Remove a line item. Same return convention as [`CartStore::set_quantity`].
    async fn remove_line_item(
        &self,
        id: CartId,
        product_id: ProductId,
    ) -> Result<Option<bool>, RepositoryError>;

    /// Replace every line item in one step. `items` must already be merged.
    async fn replace(
        &self,
        id: CartId,
        items: &[LineItem],
    ) -> Result<Option<Cart>, RepositoryError>;

    async fn clear(&self, id: CartId) -> Result<Option<Cart>, RepositoryError>;
}

/// Account persistence.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Create an account. [`RepositoryError::Conflict`] on a duplicate email.
    async fn create(&self, input: NewAccount) -> Result<Account, RepositoryError>;

    async fn get(&self, id: AccountId) -> Result<Option<Account>, RepositoryError>;

    async fn list(&self) -> Result<Vec<Account>, RepositoryError>;

    /// The account and its password hash, for login only.
    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(Account, String)>, RepositoryError>;

    async fn update(
        &self,
        id: AccountId,
        update: &AccountUpdate,
    ) -> Result<Option<Account>, RepositoryError>;

    async fn delete(&self, id: AccountId) -> Result<bool, RepositoryError>;
}

/// The three stores behind one handle.
#[derive(Clone)]
pub struct Stores {
    pub products: Arc<dyn ProductStore>,
    pub carts: Arc<dyn CartStore>,
    pub accounts: Arc<dyn AccountStore>,
}

impl Stores {
    /// `PostgreSQL`-backed stores sharing one pool.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            products: Arc::new(PgProductStore::new(pool.clone())),
            carts: Arc::new(PgCartStore::new(pool.clone())),
            accounts: Arc::new(PgAccountStore::new(pool.clone())),
        }
    }

    /// Fresh, empty in-memory stores.
    #[must_use]
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            products: store.clone(),
            carts: store.clone(),
            accounts: store,
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

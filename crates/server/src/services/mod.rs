//! Business logic services.
//!
//! Services borrow their stores from [`AppState`](crate::state::AppState) and
//! are constructed per request; they hold no state of their own.
//!
//! # Services
//!
//! - `auth` - Registration, password login and bearer tokens
//! - `accounts` - Account reads and updates with ownership rules
//! - `cart` - Line-item rules and product resolution for carts
//! - `catalog` - Product CRUD; publishes every mutation on the feed
//! - `feed` - Broadcast channel for realtime catalog observers

pub mod accounts;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod feed;

pub use accounts::{AccountError, AccountService, ProfileChanges};
pub use auth::{AuthError, AuthService, Claims, Registration, TokenKeys};
pub use cart::{CartDetail, CartError, CartLine, CartService, RequestedItem};
pub use catalog::{CatalogError, CatalogService};
pub use feed::CatalogFeed;

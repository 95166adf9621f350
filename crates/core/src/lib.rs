//! Emporium Core - Shared domain library.
//!
//! This crate provides the types and rules used across all Emporium components:
//! - `server` - Catalog, cart and account HTTP service with server-rendered views
//! - `cli` - Command-line tools for migrations, seeding and account bootstrap
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database access,
//! no HTTP. Both the PostgreSQL and the in-memory stores in `server` lean on the
//! rules defined here, so they agree on cart merging and catalog paging.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, roles and quantities
//! - [`product`] - Product records and their validation
//! - [`cart`] - Carts, line items and the merge rules
//! - [`catalog`] - Catalog filtering, sorting and pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod product;
pub mod types;

pub use cart::{Cart, LineItem, LineItemMissing, merge_line_items};
pub use catalog::{Page, PageInfo, PageRequest, PriceSort, ProductFilter, ProductQuery};
pub use product::{NewProduct, Product, ProductError, ProductUpdate};
pub use types::*;

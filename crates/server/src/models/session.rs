//! Session-stored state.
//!
//! The session only carries identifiers. The logged-in account is reloaded
//! from the store on every request, so a deleted account stops
//! authenticating immediately.

/// Session keys.
pub mod keys {
    /// Key for the logged-in account's id.
    pub const ACCOUNT_ID: &str = "account_id";

    /// Key for the browser session's cart id.
    pub const CART_ID: &str = "cart_id";
}

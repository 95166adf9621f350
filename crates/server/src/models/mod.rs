//! Domain models owned by the server.

pub mod account;
pub mod session;

pub use account::{Account, AccountUpdate, NewAccount};
pub use session::keys as session_keys;

//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, added in `main`)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (records into the span, echoes the header)
//! 4. Session layer (tower-sessions, `PostgreSQL` or memory store)
//! 5. Security headers
//!
//! Authentication is not a layer: handlers opt in through the extractors in
//! [`auth`], and view handlers get their cart through [`cart::SessionCart`].

pub mod auth;
pub mod cart;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AdminOnly, AllowedRoles, Authenticated, BearerAuth, OptionalAuth, PrivateOnly, PublicOnly,
    RequireAdmin, RequireRole, log_in, log_out,
};
pub use cart::SessionCart;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;

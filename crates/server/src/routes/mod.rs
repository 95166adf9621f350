//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page (first four products)
//! GET  /health                    - Liveness
//! GET  /health/ready              - Readiness (store reachable)
//!
//! # Products
//! GET  /products                  - Paginated listing with filter and sort
//! GET  /products/{pid}            - Product detail
//!
//! # Carts
//! GET  /cart                      - Session cart
//! POST /cart/products/{pid}       - Add to session cart (form)
//! POST /cart/products/{pid}/remove - Remove from session cart (form)
//! POST /cart/clear                - Empty session cart (form)
//! GET  /carts/{cid}               - Any cart by id
//!
//! # Realtime
//! GET  /realtimeproducts          - Live catalog page
//! GET  /realtime/products         - Server-sent catalog snapshots
//!
//! # Auth
//! GET  /login                     - Login page (anonymous only)
//! POST /login                     - Session login
//! GET  /register                  - Register page (anonymous only)
//! POST /register                  - Register and log in
//! GET  /current                   - Current account (logged in only)
//!
//! # API
//! /api/carts, /api/products, /api/users, /api/sessions - see [`api`]
//! ```

pub mod api;
pub mod auth;
pub mod carts;
pub mod health;
pub mod home;
pub mod products;
pub mod realtime;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product view routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{pid}", get(products::show))
}

/// Create the session cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(carts::session_cart))
        .route("/products/{pid}", post(carts::add))
        .route("/products/{pid}/remove", post(carts::remove))
        .route("/clear", post(carts::clear))
}

/// Create the auth view routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(api::sessions::form_login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/current", get(auth::current))
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/carts/{cid}", get(carts::show))
        .route("/realtimeproducts", get(realtime::page))
        .route("/realtime/products", get(realtime::feed))
        .merge(auth_routes())
        .nest("/api", api::routes())
}

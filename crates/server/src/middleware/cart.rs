//! Session cart extractor.
//!
//! Each browser session owns one cart, created lazily the first time a view
//! needs it. Handlers receive the id explicitly through [`SessionCart`].

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use emporium_core::CartId;

use crate::error::{AppError, ViewError};
use crate::models::session_keys;
use crate::state::AppState;

/// The session's cart id. Creates (and remembers) a cart if there is none or
/// the remembered one no longer exists.
#[derive(Debug, Clone, Copy)]
pub struct SessionCart(pub CartId);

impl FromRequestParts<AppState> for SessionCart {
    type Rejection = ViewError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let carts = state.cart_service();
        if let Some(id) = session.get::<CartId>(session_keys::CART_ID).await?
            && carts.exists(id).await?
        {
            return Ok(Self(id));
        }

        let cart = carts.create_cart().await?;
        session.insert(session_keys::CART_ID, cart.id).await?;
        tracing::debug!(cart_id = %cart.id, "session cart created");
        Ok(Self(cart.id))
    }
}

//! Cart view handlers.
//!
//! `/cart` works on the session cart; `/carts/{cid}` shows any cart by id.
//! Form posts answer with a redirect back to `/cart`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use emporium_core::{CartId, ProductId, Quantity, QuantityError};

use crate::error::ViewError;
use crate::filters;
use crate::middleware::SessionCart;
use crate::services::CartDetail;
use crate::state::AppState;

/// Add-to-cart form. A missing or blank quantity means one.
#[derive(Debug, Default, Deserialize)]
pub struct AddForm {
    pub quantity: Option<String>,
}

impl AddForm {
    fn quantity(&self) -> Result<Quantity, QuantityError> {
        match self.quantity.as_deref().map(str::trim) {
            None | Some("") => Ok(Quantity::ONE),
            Some(raw) => Quantity::from_json(&Value::String(raw.to_string())),
        }
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartTemplate {
    pub cart: CartDetail,
    /// Whether this is the visitor's own cart (editable).
    pub editable: bool,
}

/// Display the session cart.
#[instrument(skip(state))]
pub async fn session_cart(
    State(state): State<AppState>,
    SessionCart(cart_id): SessionCart,
) -> Result<CartTemplate, ViewError> {
    let cart = state.cart_service().get_cart(cart_id).await?;
    Ok(CartTemplate {
        cart,
        editable: true,
    })
}

/// Display any cart by id.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(cid): Path<String>,
) -> Result<CartTemplate, ViewError> {
    let cart = state.cart_service().get_cart(CartId::parse(&cid)?).await?;
    Ok(CartTemplate {
        cart,
        editable: false,
    })
}

/// Add a product to the session cart.
#[instrument(skip(state, form))]
pub async fn add(
    State(state): State<AppState>,
    SessionCart(cart_id): SessionCart,
    Path(pid): Path<String>,
    Form(form): Form<AddForm>,
) -> Result<Redirect, ViewError> {
    let product_id = ProductId::parse(&pid)?;
    let quantity = form.quantity()?;
    state
        .cart_service()
        .add_product(cart_id, product_id, quantity)
        .await?;
    Ok(Redirect::to("/cart"))
}

/// Remove a product from the session cart.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    SessionCart(cart_id): SessionCart,
    Path(pid): Path<String>,
) -> Result<Redirect, ViewError> {
    state
        .cart_service()
        .remove_line_item(cart_id, ProductId::parse(&pid)?)
        .await?;
    Ok(Redirect::to("/cart"))
}

/// Empty the session cart.
#[instrument(skip(state))]
pub async fn clear(
    State(state): State<AppState>,
    SessionCart(cart_id): SessionCart,
) -> Result<Redirect, ViewError> {
    state.cart_service().clear_cart(cart_id).await?;
    Ok(Redirect::to("/cart"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(quantity: Option<&str>) -> AddForm {
        AddForm {
            quantity: quantity.map(str::to_string),
        }
    }

    #[test]
    fn test_add_form_quantity() {
        assert_eq!(form(None).quantity().unwrap(), Quantity::ONE);
        assert_eq!(form(Some("  ")).quantity().unwrap(), Quantity::ONE);
        assert_eq!(form(Some("3")).quantity().unwrap().get(), 3);
        assert!(form(Some("0")).quantity().is_err());
        assert!(form(Some("lots")).quantity().is_err());
    }
}

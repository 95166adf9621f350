//! Cart API.
//!
//! ```text
//! POST   /api/carts                      - Create an empty cart (201)
//! GET    /api/carts/{cid}                - Cart with products resolved
//! PUT    /api/carts/{cid}                - Replace all line items
//! DELETE /api/carts/{cid}                - Remove all line items
//! POST   /api/carts/{cid}/products/{pid} - Add a product (body optional)
//! PUT    /api/carts/{cid}/products/{pid} - Set a line item's quantity
//! DELETE /api/carts/{cid}/products/{pid} - Remove a line item
//! ```

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use emporium_core::{Cart, CartId, ProductId, Quantity};

use super::{ApiJson, Envelope, created, ok};
use crate::error::{AppError, Result};
use crate::services::{CartDetail, RequestedItem};
use crate::state::AppState;

/// Body of `PUT /api/carts/{cid}/products/{pid}`.
#[derive(Debug, Deserialize)]
pub struct QuantityBody {
    #[serde(default)]
    pub quantity: Value,
}

/// Body of `PUT /api/carts/{cid}`.
#[derive(Debug, Deserialize)]
pub struct ReplaceBody {
    pub products: Vec<RequestedItem>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/{cid}", get(show).put(replace).delete(clear))
        .route(
            "/{cid}/products/{pid}",
            post(add_product).put(set_quantity).delete(remove_product),
        )
}

fn ids(cid: &str, pid: &str) -> Result<(CartId, ProductId)> {
    Ok((CartId::parse(cid)?, ProductId::parse(pid)?))
}

/// Quantity from an optional add-to-cart body; absent means one.
fn requested_quantity(body: &[u8]) -> Result<Quantity> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Quantity::ONE);
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidArgument(format!("invalid JSON body: {e}")))?;
    match value.get("quantity") {
        Some(quantity) => Ok(Quantity::from_json(quantity)?),
        None => Ok(Quantity::ONE),
    }
}

#[instrument(skip(state))]
pub async fn create(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let cart = state.cart_service().create_cart().await?;
    Ok(created(cart))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(cid): Path<String>,
) -> Result<Json<Envelope<CartDetail>>> {
    let cart = state.cart_service().get_cart(CartId::parse(&cid)?).await?;
    Ok(ok(cart))
}

#[instrument(skip(state, body))]
pub async fn add_product(
    State(state): State<AppState>,
    Path((cid, pid)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Envelope<Cart>>> {
    let (cart_id, product_id) = ids(&cid, &pid)?;
    let quantity = requested_quantity(&body)?;
    let cart = state
        .cart_service()
        .add_product(cart_id, product_id, quantity)
        .await?;
    Ok(Json(
        Envelope::success(cart).with_message("product added to cart"),
    ))
}

#[instrument(skip(state, body))]
pub async fn set_quantity(
    State(state): State<AppState>,
    Path((cid, pid)): Path<(String, String)>,
    ApiJson(body): ApiJson<QuantityBody>,
) -> Result<Json<Envelope<Cart>>> {
    let (cart_id, product_id) = ids(&cid, &pid)?;
    let quantity = Quantity::from_json(&body.quantity)?;
    let cart = state
        .cart_service()
        .set_quantity(cart_id, product_id, quantity)
        .await?;
    Ok(ok(cart))
}

#[instrument(skip(state))]
pub async fn remove_product(
    State(state): State<AppState>,
    Path((cid, pid)): Path<(String, String)>,
) -> Result<Json<Envelope<Cart>>> {
    let (cart_id, product_id) = ids(&cid, &pid)?;
    let cart = state
        .cart_service()
        .remove_line_item(cart_id, product_id)
        .await?;
    Ok(Json(
        Envelope::success(cart).with_message("product removed from cart"),
    ))
}

#[instrument(skip(state, body))]
pub async fn replace(
    State(state): State<AppState>,
    Path(cid): Path<String>,
    ApiJson(body): ApiJson<ReplaceBody>,
) -> Result<Json<Envelope<Cart>>> {
    let cart_id = CartId::parse(&cid)?;
    let cart = state
        .cart_service()
        .replace_line_items(cart_id, &body.products)
        .await?;
    Ok(ok(cart))
}

#[instrument(skip(state))]
pub async fn clear(
    State(state): State<AppState>,
    Path(cid): Path<String>,
) -> Result<Json<Envelope<Cart>>> {
    let cart = state
        .cart_service()
        .clear_cart(CartId::parse(&cid)?)
        .await?;
    Ok(Json(Envelope::success(cart).with_message("cart cleared")))
}

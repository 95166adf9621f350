//! Cart service.
//!
//! Enforces the line-item rules on top of [`CartStore`]:
//!
//! - adding a product already in the cart increments its quantity
//! - single-item quantities are strict; bulk replacement clamps them to 1
//! - bulk replacement checks every product in one lookup and writes nothing
//!   if any is unknown
//!
//! Cart mutations never touch the catalog feed.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use emporium_core::{
    Cart, CartId, IdError, LineItem, Product, ProductId, Quantity, QuantityError,
    merge_line_items,
};

use crate::db::{CartStore, ProductStore, RepositoryError};

/// Errors raised by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("cart not found")]
    CartNotFound(CartId),

    #[error("product not found")]
    ProductNotFound(ProductId),

    #[error("product is not in the cart")]
    LineItemNotFound(ProductId),

    #[error(transparent)]
    InvalidQuantity(#[from] QuantityError),

    /// Bulk replacement referenced products that do not exist.
    #[error("unknown products: {}", join_ids(.0))]
    UnknownProducts(Vec<ProductId>),

    #[error(transparent)]
    InvalidId(#[from] IdError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

fn join_ids(ids: &[ProductId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// One element of a bulk replacement request, as sent by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestedItem {
    pub product: String,
    #[serde(default)]
    pub quantity: Option<Value>,
}

/// A line item with its product resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    /// `None` once the product has been deleted from the catalog.
    pub product: Option<Product>,
    pub quantity: Quantity,
}

impl CartLine {
    /// Price times quantity, or `None` for a dangling line item.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.product
            .as_ref()
            .map(|p| p.price * Decimal::from(self.quantity.get()))
    }
}

/// A cart with every line item's product looked up.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDetail {
    pub id: CartId,
    #[serde(rename = "products")]
    pub lines: Vec<CartLine>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl CartDetail {
    /// Sum of all resolved line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().filter_map(CartLine::line_total).sum()
    }

    #[must_use]
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| i64::from(l.quantity.get())).sum()
    }
}

/// Cart operations over the cart and product stores.
pub struct CartService<'a> {
    carts: &'a dyn CartStore,
    products: &'a dyn ProductStore,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(carts: &'a dyn CartStore, products: &'a dyn ProductStore) -> Self {
        Self { carts, products }
    }

    /// Create an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    pub async fn create_cart(&self) -> Result<Cart, CartError> {
        let cart = self.carts.create().await?;
        debug!(cart_id = %cart.id, "cart created");
        Ok(cart)
    }

    /// Whether the cart exists.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    pub async fn exists(&self, id: CartId) -> Result<bool, CartError> {
        Ok(self.carts.get(id).await?.is_some())
    }

    /// Fetch a cart and resolve its products in one batch lookup.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` if the cart does not exist.
    pub async fn get_cart(&self, id: CartId) -> Result<CartDetail, CartError> {
        let cart = self.require_cart(id).await?;
        let found = self.products.get_many(&cart.product_ids()).await?;
        let mut by_id: HashMap<ProductId, Product> =
            found.into_iter().map(|p| (p.id, p)).collect();

        let lines = cart
            .items
            .iter()
            .map(|item| CartLine {
                product_id: item.product_id,
                product: by_id.remove(&item.product_id),
                quantity: item.quantity,
            })
            .collect();

        Ok(CartDetail {
            id: cart.id,
            lines,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        })
    }

    /// Add `quantity` of a product, merging with an existing line item.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` or `CartError::ProductNotFound` if
    /// either side is missing, and `CartError::InvalidQuantity` if the merged
    /// quantity would overflow. The cart is unchanged on error.
    pub async fn add_product(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<Cart, CartError> {
        let cart = self.require_cart(cart_id).await?;
        if self.products.get(product_id).await?.is_none() {
            return Err(CartError::ProductNotFound(product_id));
        }
        if let Some(existing) = cart.quantity_of(product_id) {
            existing.checked_add(quantity)?;
        }

        let cart = self
            .carts
            .add_line_item(cart_id, product_id, quantity)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => CartError::InvalidQuantity(QuantityError::TooLarge),
                other => CartError::Repository(other),
            })?
            .ok_or(CartError::CartNotFound(cart_id))?;
        debug!(cart_id = %cart_id, product_id = %product_id, "product added to cart");
        Ok(cart)
    }

    /// Overwrite the quantity of an existing line item.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` or `CartError::LineItemNotFound`;
    /// never adds a line item.
    pub async fn set_quantity(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<Cart, CartError> {
        match self.carts.set_quantity(cart_id, product_id, quantity).await? {
            None => Err(CartError::CartNotFound(cart_id)),
            Some(false) => Err(CartError::LineItemNotFound(product_id)),
            Some(true) => self.require_cart(cart_id).await,
        }
    }

    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` or `CartError::LineItemNotFound`.
    pub async fn remove_line_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<Cart, CartError> {
        match self.carts.remove_line_item(cart_id, product_id).await? {
            None => Err(CartError::CartNotFound(cart_id)),
            Some(false) => Err(CartError::LineItemNotFound(product_id)),
            Some(true) => self.require_cart(cart_id).await,
        }
    }

    /// Replace every line item.
    ///
    /// Quantities are clamped to at least 1 and repeated products are summed.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidId` for a malformed product id,
    /// `CartError::CartNotFound` if the cart is missing and
    /// `CartError::UnknownProducts` if any product does not exist. Nothing
    /// is written on error.
    pub async fn replace_line_items(
        &self,
        cart_id: CartId,
        requested: &[RequestedItem],
    ) -> Result<Cart, CartError> {
        let parsed = requested
            .iter()
            .map(|item| {
                let product_id = ProductId::parse(&item.product)?;
                let quantity = Quantity::clamped_from_json(item.quantity.as_ref());
                Ok(LineItem::new(product_id, quantity))
            })
            .collect::<Result<Vec<_>, IdError>>()?;
        let items = merge_line_items(parsed);

        self.require_cart(cart_id).await?;

        let ids: Vec<ProductId> = items.iter().map(|i| i.product_id).collect();
        let found = self.products.get_many(&ids).await?;
        let missing: Vec<ProductId> = ids
            .into_iter()
            .filter(|id| !found.iter().any(|p| p.id == *id))
            .collect();
        if !missing.is_empty() {
            return Err(CartError::UnknownProducts(missing));
        }

        self.carts
            .replace(cart_id, &items)
            .await?
            .ok_or(CartError::CartNotFound(cart_id))
    }

    /// Remove every line item.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` if the cart does not exist.
    pub async fn clear_cart(&self, cart_id: CartId) -> Result<Cart, CartError> {
        self.carts
            .clear(cart_id)
            .await?
            .ok_or(CartError::CartNotFound(cart_id))
    }

    async fn require_cart(&self, id: CartId) -> Result<Cart, CartError> {
        self.carts.get(id).await?.ok_or(CartError::CartNotFound(id))
    }
}

//! Carts and line-item merge rules.
//!
//! A cart holds at most one line item per product. Adding a product that is
//! already present increments its quantity instead of appending a duplicate,
//! and bulk replacement folds repeated product ids together the same way.
//! Line items keep the order in which their products were first added.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CartId, ProductId, Quantity, QuantityError};

/// The product is not one of the cart's line items.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("product is not in the cart")]
pub struct LineItemMissing(pub ProductId);

/// One (product, quantity) pair within a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "product")]
    pub product_id: ProductId,
    pub quantity: Quantity,
}

impl LineItem {
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: Quantity) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// A shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    #[serde(rename = "products")]
    pub items: Vec<LineItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// A cart with no line items.
    #[must_use]
    pub const fn empty(id: CartId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Quantity held for `product_id`, if it is a line item.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> Option<Quantity> {
        self.items
            .iter()
            .find(|item| item.product_id == product_id)
            .map(|item| item.quantity)
    }

    /// Product ids of all line items, in cart order.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.items.iter().map(|item| item.product_id).collect()
    }

    /// Sum of all line-item quantities.
    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.items
            .iter()
            .map(|item| i64::from(item.quantity.get()))
            .sum()
    }

    /// Add `quantity` units of a product, merging into an existing line item.
    ///
    /// Returns the resulting quantity of that line item.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::TooLarge`] if the increment overflows; the cart
    /// is left unchanged.
    pub fn add(
        &mut self,
        product_id: ProductId,
        quantity: Quantity,
        now: DateTime<Utc>,
    ) -> Result<Quantity, QuantityError> {
        let merged = match self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
        {
            Some(item) => {
                item.quantity = item.quantity.checked_add(quantity)?;
                item.quantity
            }
            None => {
                self.items.push(LineItem::new(product_id, quantity));
                quantity
            }
        };
        self.updated_at = now;
        Ok(merged)
    }

    /// Overwrite the quantity of an existing line item. Never adds one.
    ///
    /// # Errors
    ///
    /// Returns [`LineItemMissing`] if the product is not in the cart.
    pub fn set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: Quantity,
        now: DateTime<Utc>,
    ) -> Result<(), LineItemMissing> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
            .ok_or(LineItemMissing(product_id))?;
        item.quantity = quantity;
        self.updated_at = now;
        Ok(())
    }

    /// Remove the line item for `product_id`.
    ///
    /// # Errors
    ///
    /// Returns [`LineItemMissing`] if the product is not in the cart.
    pub fn remove(
        &mut self,
        product_id: ProductId,
        now: DateTime<Utc>,
    ) -> Result<LineItem, LineItemMissing> {
        let index = self
            .items
            .iter()
            .position(|item| item.product_id == product_id)
            .ok_or(LineItemMissing(product_id))?;
        self.updated_at = now;
        Ok(self.items.remove(index))
    }

    /// Replace every line item, merging repeated products.
    pub fn replace(&mut self, items: impl IntoIterator<Item = LineItem>, now: DateTime<Utc>) {
        self.items = merge_line_items(items);
        self.updated_at = now;
    }

    /// Drop every line item.
    pub fn clear(&mut self, now: DateTime<Utc>) {
        self.items.clear();
        self.updated_at = now;
    }
}

/// Fold line items so each product appears once, summing quantities.
///
/// The first occurrence of a product decides its position. Sums saturate at
/// [`Quantity::MAX`].
#[must_use]
pub fn merge_line_items(items: impl IntoIterator<Item = LineItem>) -> Vec<LineItem> {
    let mut merged: Vec<LineItem> = Vec::new();
    for item in items {
        match merged.iter_mut().find(|m| m.product_id == item.product_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
            None => merged.push(item),
        }
    }
    merged
}

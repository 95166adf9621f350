//! Product records and their validation.
//!
//! [`NewProduct`] and [`ProductUpdate`] are the shapes clients send; both are
//! normalised (text trimmed) and validated before they reach a store, so the
//! stores only ever see a non-empty title and category, a price of at least
//! zero and a non-negative stock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// Validation failures for product input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductError {
    #[error("title cannot be empty")]
    EmptyTitle,
    #[error("category cannot be empty")]
    EmptyCategory,
    #[error("price cannot be negative")]
    NegativePrice,
    #[error("stock cannot be negative")]
    NegativeStock,
    #[error("update must change at least one field")]
    EmptyUpdate,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category: String,
    /// Whether the product is listed as on sale.
    pub status: bool,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Build a product from validated input.
    #[must_use]
    pub fn from_new(id: ProductId, input: NewProduct, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: input.title,
            description: input.description,
            price: input.price,
            category: input.category,
            status: input.status,
            stock: input.stock,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether any units are in stock.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.stock > 0
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category: String,
    #[serde(default = "default_status")]
    pub status: bool,
    #[serde(default)]
    pub stock: i32,
}

const fn default_status() -> bool {
    true
}

impl NewProduct {
    /// Trim text fields and check the product invariants.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProductError`] found.
    pub fn validate(mut self) -> Result<Self, ProductError> {
        self.title = non_empty(&self.title).ok_or(ProductError::EmptyTitle)?;
        self.category = non_empty(&self.category).ok_or(ProductError::EmptyCategory)?;
        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(ProductError::NegativePrice);
        }
        if self.stock < 0 {
            return Err(ProductError::NegativeStock);
        }
        Ok(self)
    }
}

/// Partial update of a product. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<bool>,
    #[serde(default)]
    pub stock: Option<i32>,
}

impl ProductUpdate {
    /// Whether the update touches no field at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.status.is_none()
            && self.stock.is_none()
    }

    /// Trim text fields and check the product invariants for present fields.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::EmptyUpdate`] when nothing would change, or the
    /// first invariant a present field violates.
    pub fn validate(mut self) -> Result<Self, ProductError> {
        if self.is_empty() {
            return Err(ProductError::EmptyUpdate);
        }
        if let Some(title) = self.title.as_deref() {
            self.title = Some(non_empty(title).ok_or(ProductError::EmptyTitle)?);
        }
        if let Some(category) = self.category.as_deref() {
            self.category = Some(non_empty(category).ok_or(ProductError::EmptyCategory)?);
        }
        if self
            .price
            .is_some_and(|p| p.is_sign_negative() && !p.is_zero())
        {
            return Err(ProductError::NegativePrice);
        }
        if self.stock.is_some_and(|s| s < 0) {
            return Err(ProductError::NegativeStock);
        }
        Ok(self)
    }

    /// Apply the present fields to `product`.
    pub fn apply(&self, product: &mut Product, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            product.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            product.description.clone_from(description);
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category) = &self.category {
            product.category.clone_from(category);
        }
        if let Some(status) = self.status {
            product.status = status;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        product.updated_at = now;
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn draft() -> NewProduct {
        NewProduct {
            title: "  Dune ".to_owned(),
            description: String::new(),
            price: Decimal::new(1999, 2),
            category: " Books".to_owned(),
            status: true,
            stock: 3,
        }
    }

    #[test]
    fn test_validate_trims_text() {
        let product = draft().validate().unwrap();
        assert_eq!(product.title, "Dune");
        assert_eq!(product.category, "Books");
    }

    #[test]
    fn test_validate_rejects_blank_title_and_category() {
        let mut input = draft();
        input.title = "   ".to_owned();
        assert_eq!(input.validate(), Err(ProductError::EmptyTitle));

        let mut input = draft();
        input.category = String::new();
        assert_eq!(input.validate(), Err(ProductError::EmptyCategory));
    }

    #[test]
    fn test_validate_rejects_negative_numbers() {
        let mut input = draft();
        input.price = Decimal::new(-1, 0);
        assert_eq!(input.validate(), Err(ProductError::NegativePrice));

        let mut input = draft();
        input.stock = -1;
        assert_eq!(input.validate(), Err(ProductError::NegativeStock));
    }

    #[test]
    fn test_zero_price_is_allowed() {
        let mut input = draft();
        input.price = Decimal::ZERO;
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_new_product_defaults() {
        let input: NewProduct =
            serde_json::from_value(json!({"title": "Pen", "price": 1.5, "category": "Office"}))
                .unwrap();
        assert_eq!(input.description, "");
        assert!(input.status);
        assert_eq!(input.stock, 0);
        assert_eq!(input.price, Decimal::new(15, 1));
    }

    #[test]
    fn test_product_serializes_camel_case_with_numeric_price() {
        let now = Utc::now();
        let product = Product::from_new(ProductId::generate(), draft().validate().unwrap(), now);
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["price"], json!(19.99));
        assert!(value.get("createdAt").is_some());
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn test_update_validate_and_apply() {
        let now = Utc::now();
        let mut product =
            Product::from_new(ProductId::generate(), draft().validate().unwrap(), now);
        let update: ProductUpdate =
            serde_json::from_value(json!({"title": " Dune Messiah ", "stock": 0})).unwrap();
        let update = update.validate().unwrap();
        update.apply(&mut product, now);
        assert_eq!(product.title, "Dune Messiah");
        assert_eq!(product.stock, 0);
        assert_eq!(product.category, "Books");
        assert!(!product.is_available());
    }

    #[test]
    fn test_update_rejects_empty_and_invalid() {
        assert_eq!(
            ProductUpdate::default().validate(),
            Err(ProductError::EmptyUpdate)
        );
        let update = ProductUpdate {
            category: Some(" ".to_owned()),
            ..ProductUpdate::default()
        };
        assert_eq!(update.validate(), Err(ProductError::EmptyCategory));
    }
}

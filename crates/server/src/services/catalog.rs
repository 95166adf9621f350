//! Catalog service.
//!
//! Wraps the product store with validation and publishes the refreshed
//! catalog on the [`CatalogFeed`] after every successful mutation.

use thiserror::Error;
use tracing::{debug, error, info};

use emporium_core::{NewProduct, Page, Product, ProductError, ProductId, ProductQuery, ProductUpdate};

use super::feed::CatalogFeed;
use crate::db::{ProductStore, RepositoryError};

/// Errors raised by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Input failed validation.
    #[error(transparent)]
    Invalid(#[from] ProductError),

    /// No product with this id.
    #[error("product not found")]
    NotFound(ProductId),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Product CRUD with realtime publication.
pub struct CatalogService<'a> {
    products: &'a dyn ProductStore,
    feed: &'a CatalogFeed,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(products: &'a dyn ProductStore, feed: &'a CatalogFeed) -> Self {
        Self { products, feed }
    }

    /// One page of the catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the store fails.
    pub async fn list(&self, query: &ProductQuery) -> Result<Page<Product>, CatalogError> {
        Ok(self.products.list(query).await?)
    }

    /// The whole catalog in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the store fails.
    pub async fn snapshot(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.list_all().await?)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product does not exist.
    pub async fn get(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.products
            .get(id)
            .await?
            .ok_or(CatalogError::NotFound(id))
    }

    /// Validate and store a new product, then broadcast.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Invalid` if the input is rejected; nothing is
    /// stored in that case.
    pub async fn create(&self, input: NewProduct) -> Result<Product, CatalogError> {
        let input = input.validate()?;
        let product = self.products.create(input).await?;
        info!(product_id = %product.id, "product created");
        self.broadcast().await;
        Ok(product)
    }

    /// Apply a partial update, then broadcast.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Invalid` for an empty or invalid update and
    /// `CatalogError::NotFound` if the product does not exist.
    pub async fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, CatalogError> {
        let update = update.validate()?;
        let product = self
            .products
            .update(id, &update)
            .await?
            .ok_or(CatalogError::NotFound(id))?;
        info!(product_id = %id, "product updated");
        self.broadcast().await;
        Ok(product)
    }

    /// Delete a product, then broadcast. Carts referencing it keep a
    /// dangling line item.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), CatalogError> {
        if !self.products.delete(id).await? {
            return Err(CatalogError::NotFound(id));
        }
        info!(product_id = %id, "product deleted");
        self.broadcast().await;
        Ok(())
    }

    /// Push the current catalog to observers. Never fails the caller.
    async fn broadcast(&self) {
        let _publishing = self.feed.publishing().await;
        match self.products.list_all().await {
            Ok(products) => {
                let observers = self.feed.publish(products);
                debug!(observers, "catalog snapshot published");
            }
            Err(e) => error!(error = %e, "failed to load catalog snapshot for broadcast"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::db::MemoryStore;

    fn new_product(title: &str, category: &str) -> NewProduct {
        NewProduct {
            title: title.to_string(),
            description: String::new(),
            price: Decimal::new(1250, 2),
            category: category.to_string(),
            status: true,
            stock: 3,
        }
    }

    #[tokio::test]
    async fn test_create_validates_before_storing() {
        let store = MemoryStore::new();
        let feed = CatalogFeed::new();
        let mut rx = feed.subscribe();
        let service = CatalogService::new(&store, &feed);

        let mut input = new_product("Lamp", "Home");
        input.price = Decimal::new(-1, 0);
        let err = service.create(input).await.unwrap_err();

        assert!(matches!(err, CatalogError::Invalid(ProductError::NegativePrice)));
        assert!(service.snapshot().await.unwrap().is_empty());
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_delete_broadcasts_once_without_deleted_product() {
        let store = MemoryStore::new();
        let feed = CatalogFeed::new();
        let service = CatalogService::new(&store, &feed);
        let kept = service.create(new_product("Dune", "Books")).await.unwrap();
        let gone = service.create(new_product("Emma", "Books")).await.unwrap();

        let mut rx = feed.subscribe();
        service.delete(gone.id).await.unwrap();

        let snapshot = rx.recv().await.unwrap();
        let ids: Vec<_> = snapshot.iter().map(|p| p.id).collect();
        assert_eq!(ids, [kept.id]);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_delete_missing_product_does_not_broadcast() {
        let store = MemoryStore::new();
        let feed = CatalogFeed::new();
        let mut rx = feed.subscribe();
        let service = CatalogService::new(&store, &feed);

        let err = service.delete(ProductId::generate()).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_end_on_latest_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let feed = CatalogFeed::new();
        let mut rx = feed.subscribe();

        let writes = (0..8).map(|i| {
            let store = Arc::clone(&store);
            let feed = feed.clone();
            tokio::spawn(async move {
                CatalogService::new(store.as_ref(), &feed)
                    .create(new_product(&format!("Book {i}"), "Books"))
                    .await
                    .unwrap();
            })
        });
        for write in futures::future::join_all(writes).await {
            write.unwrap();
        }

        let mut sizes = Vec::new();
        while let Ok(snapshot) = rx.try_recv() {
            sizes.push(snapshot.len());
        }
        assert_eq!(sizes.len(), 8);
        assert!(sizes.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(sizes.last(), Some(&8));
    }

    #[tokio::test]
    async fn test_update_applies_present_fields() {
        let store = MemoryStore::new();
        let feed = CatalogFeed::new();
        let service = CatalogService::new(&store, &feed);
        let product = service.create(new_product("Dune", "Books")).await.unwrap();

        let update = ProductUpdate {
            stock: Some(0),
            ..ProductUpdate::default()
        };
        let updated = service.update(product.id, update).await.unwrap();

        assert_eq!(updated.stock, 0);
        assert_eq!(updated.title, "Dune");
        assert!(!updated.is_available());
    }

    #[tokio::test]
    async fn test_empty_update_is_rejected() {
        let store = MemoryStore::new();
        let feed = CatalogFeed::new();
        let service = CatalogService::new(&store, &feed);
        let product = service.create(new_product("Dune", "Books")).await.unwrap();

        let err = service
            .update(product.id, ProductUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(ProductError::EmptyUpdate)));
    }
}

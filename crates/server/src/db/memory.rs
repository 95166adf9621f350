//! In-memory implementation of every store.
//!
//! All state sits behind a single [`RwLock`]; every mutation holds the write
//! guard for its whole read-modify-write, so operations are serialised the
//! same way the `PostgreSQL` transactions serialise them.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use emporium_core::{
    AccountId, Cart, CartId, Email, LineItem, NewProduct, Page, Product, ProductId, ProductQuery,
    ProductUpdate, Quantity,
};

use super::{AccountStore, CartStore, ProductStore, RepositoryError};
use crate::models::{Account, AccountUpdate, NewAccount};

#[derive(Default)]
struct MemoryData {
    /// Insertion order.
    products: Vec<Product>,
    carts: HashMap<CartId, Cart>,
    /// Accounts with their password hashes, insertion order.
    accounts: Vec<(Account, String)>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl MemoryData {
    /// A timestamp strictly after every one handed out so far, so creation
    /// time alone reproduces insertion order.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(next);
        next
    }

    fn email_taken(&self, email: &Email, except: Option<AccountId>) -> bool {
        self.accounts
            .iter()
            .any(|(a, _)| a.email == *email && Some(a.id) != except)
    }
}

/// Process-local store for tests and demos.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn create(&self, input: NewProduct) -> Result<Product, RepositoryError> {
        let mut data = self.data.write().await;
        let now = data.next_timestamp();
        let product = Product::from_new(ProductId::generate(), input, now);
        data.products.push(product.clone());
        Ok(product)
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.products.iter().find(|p| p.id == id).cloned())
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn list(&self, query: &ProductQuery) -> Result<Page<Product>, RepositoryError> {
        let data = self.data.read().await;
        Ok(query.apply(&data.products))
    }

    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.products.clone())
    }

    async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut data = self.data.write().await;
        let now = data.next_timestamp();
        Ok(data.products.iter_mut().find(|p| p.id == id).map(|product| {
            update.apply(product, now);
            product.clone()
        }))
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut data = self.data.write().await;
        let before = data.products.len();
        data.products.retain(|p| p.id != id);
        Ok(data.products.len() != before)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn create(&self) -> Result<Cart, RepositoryError> {
        let mut data = self.data.write().await;
        let now = data.next_timestamp();
        let cart = Cart::empty(CartId::generate(), now);
        data.carts.insert(cart.id, cart.clone());
        Ok(cart)
    }

    async fn get(&self, id: CartId) -> Result<Option<Cart>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.carts.get(&id).cloned())
    }

    async fn add_line_item(
        &self,
        id: CartId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<Option<Cart>, RepositoryError> {
        let mut data = self.data.write().await;
        let now = data.next_timestamp();
        let Some(cart) = data.carts.get_mut(&id) else {
            return Ok(None);
        };
        cart.add(product_id, quantity, now)
            .map_err(|e| RepositoryError::Conflict(e.to_string()))?;
        Ok(Some(cart.clone()))
    }

    async fn set_quantity(
        &self,
        id: CartId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<Option<bool>, RepositoryError> {
        let mut data = self.data.write().await;
        let now = data.next_timestamp();
        Ok(data
            .carts
            .get_mut(&id)
            .map(|cart| cart.set_quantity(product_id, quantity, now).is_ok()))
    }

    async fn remove_line_item(
        &self,
        id: CartId,
        product_id: ProductId,
    ) -> Result<Option<bool>, RepositoryError> {
        let mut data = self.data.write().await;
        let now = data.next_timestamp();
        Ok(data
            .carts
            .get_mut(&id)
            .map(|cart| cart.remove(product_id, now).is_ok()))
    }

    async fn replace(
        &self,
        id: CartId,
        items: &[LineItem],
    ) -> Result<Option<Cart>, RepositoryError> {
        let mut data = self.data.write().await;
        let now = data.next_timestamp();
        Ok(data.carts.get_mut(&id).map(|cart| {
            cart.replace(items.iter().copied(), now);
            cart.clone()
        }))
    }

    async fn clear(&self, id: CartId) -> Result<Option<Cart>, RepositoryError> {
        let mut data = self.data.write().await;
        let now = data.next_timestamp();
        Ok(data.carts.get_mut(&id).map(|cart| {
            cart.clear(now);
            cart.clone()
        }))
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create(&self, input: NewAccount) -> Result<Account, RepositoryError> {
        let mut data = self.data.write().await;
        if data.email_taken(&input.email, None) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        let now = data.next_timestamp();
        let account = Account {
            id: AccountId::generate(),
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            age: input.age,
            role: input.role,
            cart: input.cart,
            created_at: now,
            updated_at: now,
        };
        data.accounts.push((account.clone(), input.password_hash));
        Ok(account)
    }

    async fn get(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data
            .accounts
            .iter()
            .find(|(a, _)| a.id == id)
            .map(|(a, _)| a.clone()))
    }

    async fn list(&self) -> Result<Vec<Account>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.accounts.iter().map(|(a, _)| a.clone()).collect())
    }

    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(Account, String)>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.accounts.iter().find(|(a, _)| a.email == *email).cloned())
    }

    async fn update(
        &self,
        id: AccountId,
        update: &AccountUpdate,
    ) -> Result<Option<Account>, RepositoryError> {
        let mut data = self.data.write().await;
        if let Some(email) = &update.email
            && data.email_taken(email, Some(id))
        {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        let now = data.next_timestamp();
        Ok(data
            .accounts
            .iter_mut()
            .find(|(a, _)| a.id == id)
            .map(|(account, hash)| {
                update.apply(account, now);
                if let Some(new_hash) = &update.password_hash {
                    hash.clone_from(new_hash);
                }
                account.clone()
            }))
    }

    async fn delete(&self, id: AccountId) -> Result<bool, RepositoryError> {
        let mut data = self.data.write().await;
        let before = data.accounts.len();
        data.accounts.retain(|(a, _)| a.id != id);
        Ok(data.accounts.len() != before)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emporium_core::Role;
    use rust_decimal::Decimal;

    use super::*;

    fn new_product(title: &str) -> NewProduct {
        NewProduct {
            title: title.to_string(),
            description: String::new(),
            price: Decimal::new(10, 0),
            category: "Books".to_string(),
            status: true,
            stock: 1,
        }
    }

    #[tokio::test]
    async fn test_products_keep_insertion_order() {
        let store = MemoryStore::new();
        for title in ["a", "b", "c"] {
            ProductStore::create(&store, new_product(title)).await.unwrap();
        }
        let page = ProductStore::list(&store, &ProductQuery::default())
            .await
            .unwrap();
        let titles: Vec<_> = page.items.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_cart_mutations_on_missing_cart_return_none() {
        let store = MemoryStore::new();
        let missing = CartId::generate();
        let product = ProductId::generate();
        assert!(
            store
                .add_line_item(missing, product, Quantity::ONE)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .set_quantity(missing, product, Quantity::ONE)
                .await
                .unwrap()
                .is_none()
        );
        assert!(CartStore::get(&store, missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_quantity_reports_missing_line_item() {
        let store = MemoryStore::new();
        let cart = CartStore::create(&store).await.unwrap();
        let result = store
            .set_quantity(cart.id, ProductId::generate(), Quantity::ONE)
            .await
            .unwrap();
        assert_eq!(result, Some(false));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        let input = NewAccount {
            first_name: "Ana".to_string(),
            last_name: "Lopez".to_string(),
            email: Email::parse("ana@example.com").unwrap(),
            age: None,
            role: Role::default(),
            cart: None,
            password_hash: "hash".to_string(),
        };
        AccountStore::create(&store, input.clone()).await.unwrap();
        let err = AccountStore::create(&store, input).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }
}

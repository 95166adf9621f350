//! `PostgreSQL` cart store.
//!
//! Line items live in `emporium.cart_item`, keyed by `(cart_id, product_id)`
//! so the database itself refuses duplicate line items. Every mutation first
//! touches the cart row inside the same transaction; zero rows touched means
//! the cart does not exist.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use emporium_core::{Cart, CartId, LineItem, ProductId, Quantity};

use super::{CartStore, RepositoryError};

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: CartId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct LineItemRow {
    product_id: ProductId,
    quantity: i32,
}

impl TryFrom<LineItemRow> for LineItem {
    type Error = RepositoryError;

    fn try_from(row: LineItemRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::try_from(row.quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid quantity in database: {e}"))
        })?;
        Ok(Self::new(row.product_id, quantity))
    }
}

/// Repository for cart database operations.
#[derive(Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    /// Create a new cart store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Bump `updated_at`; `false` if the cart does not exist.
async fn touch(conn: &mut PgConnection, id: CartId) -> Result<bool, RepositoryError> {
    let result = sqlx::query("UPDATE emporium.cart SET updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Load a cart with its line items in insertion order.
async fn load(conn: &mut PgConnection, id: CartId) -> Result<Option<Cart>, RepositoryError> {
    let Some(cart) = sqlx::query_as::<_, CartRow>(
        "SELECT id, created_at, updated_at FROM emporium.cart WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    else {
        return Ok(None);
    };

    let rows = sqlx::query_as::<_, LineItemRow>(
        r"
        SELECT product_id, quantity
        FROM emporium.cart_item
        WHERE cart_id = $1
        ORDER BY position
        ",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    let items = rows
        .into_iter()
        .map(LineItem::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Cart {
        id: cart.id,
        items,
        created_at: cart.created_at,
        updated_at: cart.updated_at,
    }))
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn create(&self) -> Result<Cart, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            "INSERT INTO emporium.cart (id) VALUES ($1) RETURNING id, created_at, updated_at",
        )
        .bind(CartId::generate())
        .fetch_one(&self.pool)
        .await?;

        Ok(Cart {
            id: row.id,
            items: Vec::new(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    async fn get(&self, id: CartId) -> Result<Option<Cart>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        load(&mut conn, id).await
    }

    async fn add_line_item(
        &self,
        id: CartId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<Option<Cart>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        if !touch(&mut tx, id).await? {
            return Ok(None);
        }

        // Concurrent adds of the same product sum instead of racing.
        sqlx::query(
            r"
            INSERT INTO emporium.cart_item (cart_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_id)
            DO UPDATE SET quantity = cart_item.quantity + EXCLUDED.quantity
            ",
        )
        .bind(id)
        .bind(product_id)
        .bind(quantity.get())
        .execute(&mut *tx)
        .await?;

        let cart = load(&mut tx, id).await?;
        tx.commit().await?;
        Ok(cart)
    }

    async fn set_quantity(
        &self,
        id: CartId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<Option<bool>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        if !touch(&mut tx, id).await? {
            return Ok(None);
        }

        let result = sqlx::query(
            "UPDATE emporium.cart_item SET quantity = $3 WHERE cart_id = $1 AND product_id = $2",
        )
        .bind(id)
        .bind(product_id)
        .bind(quantity.get())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(Some(false));
        }
        tx.commit().await?;
        Ok(Some(true))
    }

    async fn remove_line_item(
        &self,
        id: CartId,
        product_id: ProductId,
    ) -> Result<Option<bool>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        if !touch(&mut tx, id).await? {
            return Ok(None);
        }

        let result =
            sqlx::query("DELETE FROM emporium.cart_item WHERE cart_id = $1 AND product_id = $2")
                .bind(id)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(Some(false));
        }
        tx.commit().await?;
        Ok(Some(true))
    }

    async fn replace(
        &self,
        id: CartId,
        items: &[LineItem],
    ) -> Result<Option<Cart>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        if !touch(&mut tx, id).await? {
            return Ok(None);
        }

        sqlx::query("DELETE FROM emporium.cart_item WHERE cart_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for item in items {
            sqlx::query(
                "INSERT INTO emporium.cart_item (cart_id, product_id, quantity) VALUES ($1, $2, $3)",
            )
            .bind(id)
            .bind(item.product_id)
            .bind(item.quantity.get())
            .execute(&mut *tx)
            .await?;
        }

        let cart = load(&mut tx, id).await?;
        tx.commit().await?;
        Ok(cart)
    }

    async fn clear(&self, id: CartId) -> Result<Option<Cart>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        if !touch(&mut tx, id).await? {
            return Ok(None);
        }

        sqlx::query("DELETE FROM emporium.cart_item WHERE cart_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let cart = load(&mut tx, id).await?;
        tx.commit().await?;
        Ok(cart)
    }
}

//! `PostgreSQL` catalog store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use emporium_core::{
    NewProduct, Page, PriceSort, Product, ProductFilter, ProductId, ProductQuery, ProductUpdate,
};

use super::{ProductStore, RepositoryError};

/// Database row for `emporium.product`.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    title: String,
    description: String,
    price: Decimal,
    category: String,
    status: bool,
    stock: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            price: row.price,
            category: row.category,
            status: row.status,
            stock: row.stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for catalog database operations.
#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    /// Create a new product store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: Option<&ProductFilter>) {
    match filter {
        Some(ProductFilter::Category(category)) => {
            qb.push(" WHERE category = ").push_bind(category.clone());
        }
        Some(ProductFilter::Status(status)) => {
            qb.push(" WHERE status = ").push_bind(*status);
        }
        Some(ProductFilter::Available) => {
            qb.push(" WHERE stock > 0");
        }
        None => {}
    }
}

const fn order_clause(sort: Option<PriceSort>) -> &'static str {
    match sort {
        Some(PriceSort::Asc) => " ORDER BY price ASC, created_at ASC, id ASC",
        Some(PriceSort::Desc) => " ORDER BY price DESC, created_at ASC, id ASC",
        None => " ORDER BY created_at ASC, id ASC",
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn create(&self, input: NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO emporium.product (id, title, description, price, category, status, stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, description, price, category, status, stock,
                      created_at, updated_at
            ",
        )
        .bind(ProductId::generate())
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.price)
        .bind(&input.category)
        .bind(input.status)
        .bind(input.stock)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, title, description, price, category, status, stock,
                   created_at, updated_at
            FROM emporium.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, title, description, price, category, status, stock,
                   created_at, updated_at
            FROM emporium.product
            WHERE id = ANY($1)
            ",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn list(&self, query: &ProductQuery) -> Result<Page<Product>, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM emporium.product");
        push_filter(&mut count, query.filter.as_ref());
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(
            "SELECT id, title, description, price, category, status, stock, \
             created_at, updated_at FROM emporium.product",
        );
        push_filter(&mut select, query.filter.as_ref());
        select.push(order_clause(query.sort));
        select
            .push(" LIMIT ")
            .push_bind(i64::from(query.page.page_size))
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.page.offset()).unwrap_or(i64::MAX));
        let rows: Vec<ProductRow> = select.build_query_as().fetch_all(&self.pool).await?;

        let total = u64::try_from(total)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative count {total}")))?;
        Ok(Page::new(
            rows.into_iter().map(Product::from).collect(),
            total,
            query.page,
        ))
    }

    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, title, description, price, category, status, stock,
                   created_at, updated_at
            FROM emporium.product
            ORDER BY created_at ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE emporium.product SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                category = COALESCE($5, category),
                status = COALESCE($6, status),
                stock = COALESCE($7, stock),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, price, category, status, stock,
                      created_at, updated_at
            ",
        )
        .bind(id)
        .bind(update.title.as_deref())
        .bind(update.description.as_deref())
        .bind(update.price)
        .bind(update.category.as_deref())
        .bind(update.status)
        .bind(update.stock)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM emporium.product WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

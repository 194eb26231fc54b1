//! # Product Repository
//!
//! Database operations for products. Same lifecycle shape as customers:
//! soft delete only, with the product name as the natural key unique among
//! active rows.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// A product row.
///
/// `price_cents` is the catalog price. Invoice line items snapshot their own
/// price at write time and never read this column again.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
}

/// Partial update: only `Some` fields are written.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
}

impl ProductPatch {
    /// True when no field was provided at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.price_cents.is_none()
    }
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product and returns the created row.
    pub async fn insert(&self, new: &NewProduct) -> DbResult<Product> {
        debug!(name = %new.name, "Inserting product");

        let now = Utc::now();
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, description, price_cents, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, 1, ?4, ?4)
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price_cents)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    /// Finds the id of an ACTIVE product with this name.
    pub async fn find_active_by_name(
        &self,
        name: &str,
        exclude_id: Option<i64>,
    ) -> DbResult<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id FROM products
            WHERE name = ?1 AND is_active = 1 AND id != ?2
            "#,
        )
        .bind(name)
        .bind(exclude_id.unwrap_or(-1))
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }

    /// Lists active products, newest first.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE is_active = 1
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets an active product by id.
    pub async fn get_active(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Applies a partial update to an active product.
    pub async fn update(&self, id: i64, patch: &ProductPatch) -> DbResult<()> {
        debug!(id = %id, "Updating product");

        let now = Utc::now();
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE products SET ");

        let mut fields = qb.separated(", ");
        if let Some(name) = &patch.name {
            fields.push("name = ").push_bind_unseparated(name);
        }
        if let Some(description) = &patch.description {
            fields
                .push("description = ")
                .push_bind_unseparated(description);
        }
        if let Some(price_cents) = patch.price_cents {
            fields
                .push("price_cents = ")
                .push_bind_unseparated(price_cents);
        }
        fields.push("updated_at = ").push_bind_unseparated(now);

        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND is_active = 1");

        let result = qb.build().execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = 0.
    ///
    /// Historical invoice items keep referencing the row; they carry their
    /// own price snapshot and survive the deletion untouched.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE products
            SET is_active = 0, updated_at = ?2
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

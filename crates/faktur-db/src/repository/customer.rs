//! # Customer Repository
//!
//! Database operations for customers.
//!
//! ## Key Rules
//! - Soft delete only: `is_active = 0`, row stays
//! - Contact number is the natural key, unique among ACTIVE rows only -
//!   a soft-deleted customer's contact can be reused

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// A customer row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub contact: String,
    pub email: String,
    pub address: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a customer. Optional fields are already normalized
/// ("NA" placeholders) by the validation layer.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub contact: String,
    pub email: String,
    pub address: String,
}

/// Partial update: only `Some` fields are written.
#[derive(Debug, Clone, Default)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl CustomerPatch {
    /// True when no field was provided at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.contact.is_none()
            && self.email.is_none()
            && self.address.is_none()
    }
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts a new customer and returns the created row.
    ///
    /// Duplicate-contact checking is the caller's job (via
    /// [`find_active_by_contact`](Self::find_active_by_contact)) so the
    /// conflict can be reported before anything is written.
    pub async fn insert(&self, new: &NewCustomer) -> DbResult<Customer> {
        debug!(contact = %new.contact, "Inserting customer");

        let now = Utc::now();
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, contact, email, address, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(&new.contact)
        .bind(&new.email)
        .bind(&new.address)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Finds the id of an ACTIVE customer holding this contact number.
    ///
    /// `exclude_id` skips the row being updated so a customer can keep its
    /// own contact.
    pub async fn find_active_by_contact(
        &self,
        contact: &str,
        exclude_id: Option<i64>,
    ) -> DbResult<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id FROM customers
            WHERE contact = ?1 AND is_active = 1 AND id != ?2
            "#,
        )
        .bind(contact)
        .bind(exclude_id.unwrap_or(-1))
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }

    /// Lists active customers, newest first.
    pub async fn list_active(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE is_active = 1
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Gets an active customer by id.
    pub async fn get_active(&self, id: i64) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Applies a partial update to an active customer.
    ///
    /// The statement is assembled from the provided fields with bound
    /// parameters only - field names come from this code, values from binds.
    pub async fn update(&self, id: i64, patch: &CustomerPatch) -> DbResult<()> {
        debug!(id = %id, "Updating customer");

        let now = Utc::now();
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE customers SET ");

        let mut fields = qb.separated(", ");
        if let Some(name) = &patch.name {
            fields.push("name = ").push_bind_unseparated(name);
        }
        if let Some(contact) = &patch.contact {
            fields.push("contact = ").push_bind_unseparated(contact);
        }
        if let Some(email) = &patch.email {
            fields.push("email = ").push_bind_unseparated(email);
        }
        if let Some(address) = &patch.address {
            fields.push("address = ").push_bind_unseparated(address);
        }
        fields.push("updated_at = ").push_bind_unseparated(now);

        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND is_active = 1");

        let result = qb.build().execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Soft-deletes a customer by setting is_active = 0.
    ///
    /// Deleting an already-deleted (or missing) customer reports NotFound -
    /// the second delete is an idempotent failure, not a crash.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting customer");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET is_active = 0, updated_at = ?2
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn sample(contact: &str) -> NewCustomer {
        NewCustomer {
            name: "Ali Traders".to_string(),
            contact: contact.to_string(),
            email: "NA".to_string(),
            address: "NA".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let created = repo.insert(&sample("0301234567")).await.unwrap();
        assert!(created.is_active);

        let fetched = repo.get_active(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.contact, "0301234567");
        assert_eq!(fetched.email, "NA");
    }

    #[tokio::test]
    async fn test_contact_reusable_after_soft_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let first = repo.insert(&sample("0301234567")).await.unwrap();
        assert!(repo
            .find_active_by_contact("0301234567", None)
            .await
            .unwrap()
            .is_some());

        repo.soft_delete(first.id).await.unwrap();

        // The soft-deleted row no longer blocks the contact.
        assert!(repo
            .find_active_by_contact("0301234567", None)
            .await
            .unwrap()
            .is_none());
        repo.insert(&sample("0301234567")).await.unwrap();
    }

    #[tokio::test]
    async fn test_double_delete_reports_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let created = repo.insert(&sample("0300000001")).await.unwrap();
        repo.soft_delete(created.id).await.unwrap();

        let err = repo.soft_delete(created.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_partial_update_touches_only_provided_fields() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let created = repo.insert(&sample("0300000002")).await.unwrap();
        let patch = CustomerPatch {
            address: Some("Mall Road, Lahore".to_string()),
            ..Default::default()
        };
        repo.update(created.id, &patch).await.unwrap();

        let fetched = repo.get_active(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.address, "Mall Road, Lahore");
        assert_eq!(fetched.name, "Ali Traders");
        assert_eq!(fetched.contact, "0300000002");
    }

    #[tokio::test]
    async fn test_update_inactive_customer_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let created = repo.insert(&sample("0300000003")).await.unwrap();
        repo.soft_delete(created.id).await.unwrap();

        let patch = CustomerPatch {
            name: Some("Ghost".to_string()),
            ..Default::default()
        };
        let err = repo.update(created.id, &patch).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let a = repo.insert(&sample("0300000010")).await.unwrap();
        let b = repo.insert(&sample("0300000011")).await.unwrap();

        let list = repo.list_active().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, b.id);
        assert_eq!(list[1].id, a.id);
    }
}

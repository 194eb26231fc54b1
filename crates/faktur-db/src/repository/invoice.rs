//! # Invoice Repository
//!
//! Database operations for invoices and their line items. This is the one
//! repository with real orchestration: creation and update are each a single
//! transaction covering cross-entity checks, item mutations, and the grand
//! total recomputation.
//!
//! ## Invoice Update Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    1. invoice active?                 → else rollback (not found)       │
//! │    2. new customer_id active?         → else rollback (not found)       │
//! │    3. every submitted product active? → else rollback (not found)       │
//! │    4. snapshot current active item ids  ← the transaction's snapshot    │
//! │    5. plan = diff(snapshot, submitted)  (pure, faktur-core)             │
//! │         claimed item_id not in snapshot → rollback (item not found)     │
//! │    6. apply: update existing → insert new → soft-delete removals        │
//! │         every item write persists total = price × quantity              │
//! │    7. grand_total = SUM(total) over now-active rows                     │
//! │    8. persist header changes + grand_total                              │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two concurrent updates of the same invoice serialize on the write
//! transaction, so the removal set can never be computed from a stale
//! snapshot.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use faktur_core::invoice::{grand_total, plan_update, ItemSubmission};
use faktur_core::CoreError;

// =============================================================================
// Row Types
// =============================================================================

/// An invoice row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Invoice {
    pub id: i64,
    pub customer_id: i64,
    pub invoice_date: NaiveDate,
    pub grand_total_cents: i64,
    pub is_active: bool,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

/// An invoice joined with its customer, as listed by the admin UI.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InvoiceSummary {
    pub id: i64,
    pub customer_id: i64,
    pub customer_name: String,
    pub customer_contact: String,
    pub invoice_date: NaiveDate,
    pub grand_total_cents: i64,
}

/// A line item row. `price_cents` is the snapshot taken at write time;
/// `total_cents` is persisted alongside it in the same statement.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InvoiceItem {
    pub id: i64,
    pub invoice_id: i64,
    pub product_id: i64,
    pub price_cents: i64,
    pub quantity: i64,
    pub total_cents: i64,
    pub is_active: bool,
    pub created_at: chrono::DateTime<Utc>,
}

/// A line item joined with its product, for invoice detail views.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InvoiceItemDetail {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_description: String,
    pub price_cents: i64,
    pub quantity: i64,
    pub total_cents: i64,
}

/// Header-level partial update (items travel separately).
#[derive(Debug, Clone, Default)]
pub struct InvoiceHeaderPatch {
    pub customer_id: Option<i64>,
    pub invoice_date: Option<NaiveDate>,
}

impl InvoiceHeaderPatch {
    /// True when no header field was provided.
    pub fn is_empty(&self) -> bool {
        self.customer_id.is_none() && self.invoice_date.is_none()
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Creates an invoice with its line items in one transaction.
    ///
    /// Expects items already validated by `faktur_core::invoice` (non-empty,
    /// no duplicate products, positive price/quantity). This method adds the
    /// referential checks - customer active, every product active - and only
    /// then writes. Any failure rolls the whole invoice back.
    ///
    /// The grand total is computed in application code from the submitted
    /// values; the product catalog is never consulted for prices.
    pub async fn create(
        &self,
        customer_id: i64,
        invoice_date: NaiveDate,
        items: &[ItemSubmission],
    ) -> DbResult<(Invoice, Vec<InvoiceItem>)> {
        debug!(customer_id = %customer_id, items = items.len(), "Creating invoice");

        let mut tx = self.pool.begin().await?;

        ensure_active_customer(&mut tx, customer_id).await?;
        for item in items {
            ensure_active_product(&mut tx, item.product_id).await?;
        }

        let total = grand_total(items);
        let now = Utc::now();

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (customer_id, invoice_date, grand_total_cents, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, 1, ?4, ?4)
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(invoice_date)
        .bind(total.cents())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let mut created_items = Vec::with_capacity(items.len());
        for item in items {
            let row = sqlx::query_as::<_, InvoiceItem>(
                r#"
                INSERT INTO invoice_items (invoice_id, product_id, price_cents, quantity, total_cents, is_active, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
                RETURNING *
                "#,
            )
            .bind(invoice.id)
            .bind(item.product_id)
            .bind(item.price_cents)
            .bind(item.quantity)
            .bind(item.line_total().cents())
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;
            created_items.push(row);
        }

        tx.commit().await?;

        info!(
            invoice_id = %invoice.id,
            grand_total = %total,
            items = created_items.len(),
            "Invoice created"
        );

        Ok((invoice, created_items))
    }

    /// Lists active invoices with their customer, newest first.
    pub async fn list_active(&self) -> DbResult<Vec<InvoiceSummary>> {
        let invoices = sqlx::query_as::<_, InvoiceSummary>(
            r#"
            SELECT
                i.id,
                i.customer_id,
                c.name AS customer_name,
                c.contact AS customer_contact,
                i.invoice_date,
                i.grand_total_cents
            FROM invoices i
            LEFT JOIN customers c ON i.customer_id = c.id
            WHERE i.is_active = 1
            ORDER BY i.invoice_date DESC, i.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    /// Gets an active invoice (with customer) by id.
    pub async fn get_active(&self, id: i64) -> DbResult<Option<InvoiceSummary>> {
        let invoice = sqlx::query_as::<_, InvoiceSummary>(
            r#"
            SELECT
                i.id,
                i.customer_id,
                c.name AS customer_name,
                c.contact AS customer_contact,
                i.invoice_date,
                i.grand_total_cents
            FROM invoices i
            LEFT JOIN customers c ON i.customer_id = c.id
            WHERE i.id = ?1 AND i.is_active = 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    /// Gets the active line items of an invoice, with product details.
    pub async fn get_items(&self, invoice_id: i64) -> DbResult<Vec<InvoiceItemDetail>> {
        let items = sqlx::query_as::<_, InvoiceItemDetail>(
            r#"
            SELECT
                ii.id,
                ii.product_id,
                p.name AS product_name,
                p.description AS product_description,
                ii.price_cents,
                ii.quantity,
                ii.total_cents
            FROM invoice_items ii
            JOIN products p ON ii.product_id = p.id
            WHERE ii.invoice_id = ?1 AND ii.is_active = 1
            ORDER BY ii.id
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Applies an invoice update - header fields and/or a full replacement
    /// item set - in one transaction.
    ///
    /// When `items` is `Some`, the submitted collection is the invoice's
    /// desired final state: existing items (by item_id) update in place, new
    /// ones insert, and active items missing from the submission soft-delete.
    /// The grand total is then recomputed from the surviving rows. When
    /// `items` is `None`, only header fields change and the grand total is
    /// left untouched.
    pub async fn update(
        &self,
        invoice_id: i64,
        header: &InvoiceHeaderPatch,
        items: Option<&[ItemSubmission]>,
    ) -> DbResult<()> {
        debug!(invoice_id = %invoice_id, "Updating invoice");

        let mut tx = self.pool.begin().await?;

        let active = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM invoices WHERE id = ?1 AND is_active = 1",
        )
        .bind(invoice_id)
        .fetch_optional(&mut *tx)
        .await?;
        if active.is_none() {
            return Err(DbError::not_found("Invoice", invoice_id));
        }

        if let Some(customer_id) = header.customer_id {
            ensure_active_customer(&mut tx, customer_id).await?;
        }

        let mut new_grand_total: Option<i64> = None;

        if let Some(items) = items {
            for item in items {
                ensure_active_product(&mut tx, item.product_id).await?;
            }

            // The snapshot this diff runs against is the transaction's own
            // read - a concurrent update cannot slip between snapshot and
            // apply.
            let current: Vec<i64> = sqlx::query_scalar::<_, i64>(
                "SELECT id FROM invoice_items WHERE invoice_id = ?1 AND is_active = 1",
            )
            .bind(invoice_id)
            .fetch_all(&mut *tx)
            .await?;

            let plan = plan_update(&current, items.to_vec()).map_err(|e| match e {
                CoreError::ItemNotInInvoice { item_id } => DbError::not_found("Item", item_id),
                other => DbError::Internal(other.to_string()),
            })?;

            for item in &plan.updates {
                if let Some(item_id) = item.item_id {
                    sqlx::query(
                        r#"
                        UPDATE invoice_items
                        SET product_id = ?2, price_cents = ?3, quantity = ?4, total_cents = ?5
                        WHERE id = ?1 AND invoice_id = ?6
                        "#,
                    )
                    .bind(item_id)
                    .bind(item.product_id)
                    .bind(item.price_cents)
                    .bind(item.quantity)
                    .bind(item.line_total().cents())
                    .bind(invoice_id)
                    .execute(&mut *tx)
                    .await?;
                }
            }

            let now = Utc::now();
            for item in &plan.inserts {
                sqlx::query(
                    r#"
                    INSERT INTO invoice_items (invoice_id, product_id, price_cents, quantity, total_cents, is_active, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
                    "#,
                )
                .bind(invoice_id)
                .bind(item.product_id)
                .bind(item.price_cents)
                .bind(item.quantity)
                .bind(item.line_total().cents())
                .bind(now)
                .execute(&mut *tx)
                .await?;
            }

            for item_id in &plan.removals {
                sqlx::query(
                    "UPDATE invoice_items SET is_active = 0 WHERE id = ?1 AND invoice_id = ?2",
                )
                .bind(item_id)
                .bind(invoice_id)
                .execute(&mut *tx)
                .await?;
            }

            // Every surviving row's total_cents was written above, so the
            // aggregate read is consistent by construction.
            let sum = sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COALESCE(SUM(total_cents), 0)
                FROM invoice_items
                WHERE invoice_id = ?1 AND is_active = 1
                "#,
            )
            .bind(invoice_id)
            .fetch_one(&mut *tx)
            .await?;

            new_grand_total = Some(sum);
        }

        if !header.is_empty() || new_grand_total.is_some() {
            let now = Utc::now();
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE invoices SET ");

            let mut fields = qb.separated(", ");
            if let Some(customer_id) = header.customer_id {
                fields
                    .push("customer_id = ")
                    .push_bind_unseparated(customer_id);
            }
            if let Some(invoice_date) = header.invoice_date {
                fields
                    .push("invoice_date = ")
                    .push_bind_unseparated(invoice_date);
            }
            if let Some(total) = new_grand_total {
                fields
                    .push("grand_total_cents = ")
                    .push_bind_unseparated(total);
            }
            fields.push("updated_at = ").push_bind_unseparated(now);

            qb.push(" WHERE id = ").push_bind(invoice_id);
            qb.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        info!(invoice_id = %invoice_id, "Invoice updated");
        Ok(())
    }

    /// Soft-deletes an invoice and its items; returns how many items were
    /// deactivated.
    pub async fn soft_delete(&self, invoice_id: i64) -> DbResult<u64> {
        debug!(invoice_id = %invoice_id, "Soft-deleting invoice");

        let mut tx = self.pool.begin().await?;

        let active = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM invoices WHERE id = ?1 AND is_active = 1",
        )
        .bind(invoice_id)
        .fetch_optional(&mut *tx)
        .await?;
        if active.is_none() {
            return Err(DbError::not_found("Invoice", invoice_id));
        }

        let items = sqlx::query(
            "UPDATE invoice_items SET is_active = 0 WHERE invoice_id = ?1 AND is_active = 1",
        )
        .bind(invoice_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE invoices SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(invoice_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(invoice_id = %invoice_id, items_deleted = items.rows_affected(), "Invoice deleted");
        Ok(items.rows_affected())
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

async fn ensure_active_customer(
    tx: &mut Transaction<'_, Sqlite>,
    customer_id: i64,
) -> DbResult<()> {
    let exists =
        sqlx::query_scalar::<_, i64>("SELECT id FROM customers WHERE id = ?1 AND is_active = 1")
            .bind(customer_id)
            .fetch_optional(&mut **tx)
            .await?;

    if exists.is_none() {
        return Err(DbError::not_found("Customer", customer_id));
    }
    Ok(())
}

async fn ensure_active_product(tx: &mut Transaction<'_, Sqlite>, product_id: i64) -> DbResult<()> {
    let exists =
        sqlx::query_scalar::<_, i64>("SELECT id FROM products WHERE id = ?1 AND is_active = 1")
            .bind(product_id)
            .fetch_optional(&mut **tx)
            .await?;

    if exists.is_none() {
        return Err(DbError::not_found("Product", product_id));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
// Workflow-level coverage (creation totals, replace-by-diff, header-only
// updates) lives in tests/invoice_flow.rs; these tests pin the referential
// failure modes.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::customer::NewCustomer;
    use crate::repository::product::NewProduct;

    async fn seed(db: &Database) -> (i64, i64) {
        let customer = db
            .customers()
            .insert(&NewCustomer {
                name: "Ali Traders".to_string(),
                contact: "0301234567".to_string(),
                email: "NA".to_string(),
                address: "NA".to_string(),
            })
            .await
            .unwrap();
        let product = db
            .products()
            .insert(&NewProduct {
                name: "Steel Pipe".to_string(),
                description: "NA".to_string(),
                price_cents: 1000,
            })
            .await
            .unwrap();
        (customer.id, product.id)
    }

    fn item(product_id: i64, price_cents: i64, quantity: i64) -> ItemSubmission {
        ItemSubmission {
            item_id: None,
            product_id,
            price_cents,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_missing_customer() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (_, product_id) = seed(&db).await;

        let err = db
            .invoices()
            .create(999, Utc::now().date_naive(), &[item(product_id, 1000, 1)])
            .await
            .unwrap_err();

        match err {
            DbError::NotFound { entity, .. } => assert_eq!(entity, "Customer"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_inactive_product_and_writes_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (customer_id, product_id) = seed(&db).await;
        db.products().soft_delete(product_id).await.unwrap();

        let err = db
            .invoices()
            .create(
                customer_id,
                Utc::now().date_naive(),
                &[item(product_id, 1000, 1)],
            )
            .await
            .unwrap_err();

        match err {
            DbError::NotFound { entity, id } => {
                assert_eq!(entity, "Product");
                assert_eq!(id, product_id.to_string());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(db.invoices().list_active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_invoice_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed(&db).await;

        let err = db
            .invoices()
            .update(42, &InvoiceHeaderPatch::default(), None)
            .await
            .unwrap_err();

        match err {
            DbError::NotFound { entity, .. } => assert_eq!(entity, "Invoice"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_foreign_item_id_rolls_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (customer_id, product_id) = seed(&db).await;

        let (invoice, _) = db
            .invoices()
            .create(
                customer_id,
                Utc::now().date_naive(),
                &[item(product_id, 1000, 2)],
            )
            .await
            .unwrap();

        let bogus = ItemSubmission {
            item_id: Some(9999),
            product_id,
            price_cents: 500,
            quantity: 1,
        };
        let err = db
            .invoices()
            .update(invoice.id, &InvoiceHeaderPatch::default(), Some(&[bogus]))
            .await
            .unwrap_err();

        match err {
            DbError::NotFound { entity, id } => {
                assert_eq!(entity, "Item");
                assert_eq!(id, "9999");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Nothing changed: original item still active, total intact.
        let summary = db.invoices().get_active(invoice.id).await.unwrap().unwrap();
        assert_eq!(summary.grand_total_cents, 2000);
        assert_eq!(db.invoices().get_items(invoice.id).await.unwrap().len(), 1);
    }
}

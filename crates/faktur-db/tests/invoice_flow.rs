//! End-to-end coverage of the invoice write path against an in-memory
//! database: creation totals, the replace-by-diff update, header-only
//! updates, and soft-delete semantics.

use chrono::Utc;
use faktur_db::{Database, DbConfig, InvoiceHeaderPatch, NewCustomer, NewProduct};
use faktur_core::invoice::ItemSubmission;

async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn seed_customer(db: &Database, contact: &str) -> i64 {
    db.customers()
        .insert(&NewCustomer {
            name: "Ali Traders".to_string(),
            contact: contact.to_string(),
            email: "NA".to_string(),
            address: "NA".to_string(),
        })
        .await
        .unwrap()
        .id
}

async fn seed_product(db: &Database, name: &str, price_cents: i64) -> i64 {
    db.products()
        .insert(&NewProduct {
            name: name.to_string(),
            description: "NA".to_string(),
            price_cents,
        })
        .await
        .unwrap()
        .id
}

fn new_item(product_id: i64, price_cents: i64, quantity: i64) -> ItemSubmission {
    ItemSubmission {
        item_id: None,
        product_id,
        price_cents,
        quantity,
    }
}

fn existing_item(
    item_id: i64,
    product_id: i64,
    price_cents: i64,
    quantity: i64,
) -> ItemSubmission {
    ItemSubmission {
        item_id: Some(item_id),
        product_id,
        price_cents,
        quantity,
    }
}

#[tokio::test]
async fn creating_invoice_computes_grand_total_and_persists_items() {
    let db = test_db().await;
    let customer_id = seed_customer(&db, "0301234567").await;
    let p1 = seed_product(&db, "Steel Pipe", 1000).await;
    let p2 = seed_product(&db, "Cement Bag", 500).await;

    // price 10.00 × 2 + price 5.00 × 1 = 25.00
    let (invoice, items) = db
        .invoices()
        .create(
            customer_id,
            Utc::now().date_naive(),
            &[new_item(p1, 1000, 2), new_item(p2, 500, 1)],
        )
        .await
        .unwrap();

    assert_eq!(invoice.grand_total_cents, 2500);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].total_cents, 2000);
    assert_eq!(items[1].total_cents, 500);

    // The persisted aggregate matches the per-row totals.
    let detail = db.invoices().get_items(invoice.id).await.unwrap();
    let sum: i64 = detail.iter().map(|i| i.total_cents).sum();
    assert_eq!(sum, invoice.grand_total_cents);
}

#[tokio::test]
async fn creating_invoice_for_soft_deleted_customer_is_rejected() {
    let db = test_db().await;
    let customer_id = seed_customer(&db, "0301234567").await;
    let p1 = seed_product(&db, "Steel Pipe", 1000).await;

    db.customers().soft_delete(customer_id).await.unwrap();

    let err = db
        .invoices()
        .create(customer_id, Utc::now().date_naive(), &[new_item(p1, 1000, 1)])
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Customer not found"));
    assert!(db.invoices().list_active().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_omitting_an_item_soft_deletes_it_and_shrinks_the_total() {
    let db = test_db().await;
    let customer_id = seed_customer(&db, "0301234567").await;
    let p1 = seed_product(&db, "Steel Pipe", 1000).await;
    let p2 = seed_product(&db, "Cement Bag", 500).await;

    let (invoice, items) = db
        .invoices()
        .create(
            customer_id,
            Utc::now().date_naive(),
            &[new_item(p1, 1000, 2), new_item(p2, 500, 1)],
        )
        .await
        .unwrap();
    let kept = &items[0];

    // Resubmit only the first item: the second is scheduled for removal.
    db.invoices()
        .update(
            invoice.id,
            &InvoiceHeaderPatch::default(),
            Some(&[existing_item(kept.id, p1, 1000, 2)]),
        )
        .await
        .unwrap();

    let detail = db.invoices().get_items(invoice.id).await.unwrap();
    assert_eq!(detail.len(), 1);
    assert_eq!(detail[0].id, kept.id);

    let summary = db.invoices().get_active(invoice.id).await.unwrap().unwrap();
    assert_eq!(summary.grand_total_cents, 2000);
}

#[tokio::test]
async fn update_can_mix_in_place_updates_inserts_and_removals() {
    let db = test_db().await;
    let customer_id = seed_customer(&db, "0301234567").await;
    let p1 = seed_product(&db, "Steel Pipe", 1000).await;
    let p2 = seed_product(&db, "Cement Bag", 500).await;
    let p3 = seed_product(&db, "Rebar", 700).await;

    let (invoice, items) = db
        .invoices()
        .create(
            customer_id,
            Utc::now().date_naive(),
            &[new_item(p1, 1000, 2), new_item(p2, 500, 1)],
        )
        .await
        .unwrap();

    // Keep item 1 with a new quantity, drop item 2, add a p3 line.
    db.invoices()
        .update(
            invoice.id,
            &InvoiceHeaderPatch::default(),
            Some(&[
                existing_item(items[0].id, p1, 1000, 3),
                new_item(p3, 700, 2),
            ]),
        )
        .await
        .unwrap();

    let detail = db.invoices().get_items(invoice.id).await.unwrap();
    assert_eq!(detail.len(), 2);

    let updated = detail.iter().find(|i| i.id == items[0].id).unwrap();
    assert_eq!(updated.quantity, 3);
    assert_eq!(updated.total_cents, 3000);

    let inserted = detail.iter().find(|i| i.product_id == p3).unwrap();
    assert_eq!(inserted.total_cents, 1400);

    let summary = db.invoices().get_active(invoice.id).await.unwrap().unwrap();
    assert_eq!(summary.grand_total_cents, 4400);
}

#[tokio::test]
async fn header_only_update_leaves_items_and_total_untouched() {
    let db = test_db().await;
    let customer_id = seed_customer(&db, "0301234567").await;
    let p1 = seed_product(&db, "Steel Pipe", 1000).await;

    let (invoice, _) = db
        .invoices()
        .create(customer_id, Utc::now().date_naive(), &[new_item(p1, 1000, 2)])
        .await
        .unwrap();

    let new_date = chrono::NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
    db.invoices()
        .update(
            invoice.id,
            &InvoiceHeaderPatch {
                invoice_date: Some(new_date),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    let summary = db.invoices().get_active(invoice.id).await.unwrap().unwrap();
    assert_eq!(summary.invoice_date, new_date);
    assert_eq!(summary.grand_total_cents, 2000);
    assert_eq!(db.invoices().get_items(invoice.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_can_move_invoice_to_another_active_customer() {
    let db = test_db().await;
    let first = seed_customer(&db, "0301234567").await;
    let second = seed_customer(&db, "0309999999").await;
    let p1 = seed_product(&db, "Steel Pipe", 1000).await;

    let (invoice, _) = db
        .invoices()
        .create(first, Utc::now().date_naive(), &[new_item(p1, 1000, 1)])
        .await
        .unwrap();

    db.invoices()
        .update(
            invoice.id,
            &InvoiceHeaderPatch {
                customer_id: Some(second),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    let summary = db.invoices().get_active(invoice.id).await.unwrap().unwrap();
    assert_eq!(summary.customer_id, second);

    // An inactive target customer is rejected.
    db.customers().soft_delete(first).await.unwrap();
    let err = db
        .invoices()
        .update(
            invoice.id,
            &InvoiceHeaderPatch {
                customer_id: Some(first),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Customer not found"));
}

#[tokio::test]
async fn price_stays_snapshotted_when_catalog_changes() {
    let db = test_db().await;
    let customer_id = seed_customer(&db, "0301234567").await;
    let p1 = seed_product(&db, "Steel Pipe", 1000).await;

    let (invoice, _) = db
        .invoices()
        .create(customer_id, Utc::now().date_naive(), &[new_item(p1, 1000, 2)])
        .await
        .unwrap();

    // Catalog price doubles after the sale; the invoice must not move.
    db.products()
        .update(
            p1,
            &faktur_db::ProductPatch {
                price_cents: Some(2000),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let detail = db.invoices().get_items(invoice.id).await.unwrap();
    assert_eq!(detail[0].price_cents, 1000);
    let summary = db.invoices().get_active(invoice.id).await.unwrap().unwrap();
    assert_eq!(summary.grand_total_cents, 2000);
}

#[tokio::test]
async fn soft_deleting_invoice_hides_it_and_its_items() {
    let db = test_db().await;
    let customer_id = seed_customer(&db, "0301234567").await;
    let p1 = seed_product(&db, "Steel Pipe", 1000).await;
    let p2 = seed_product(&db, "Cement Bag", 500).await;

    let (invoice, _) = db
        .invoices()
        .create(
            customer_id,
            Utc::now().date_naive(),
            &[new_item(p1, 1000, 1), new_item(p2, 500, 1)],
        )
        .await
        .unwrap();

    let items_deleted = db.invoices().soft_delete(invoice.id).await.unwrap();
    assert_eq!(items_deleted, 2);

    assert!(db.invoices().get_active(invoice.id).await.unwrap().is_none());
    assert!(db.invoices().list_active().await.unwrap().is_empty());

    // Second delete: idempotent failure, not a crash.
    assert!(db.invoices().soft_delete(invoice.id).await.is_err());
}

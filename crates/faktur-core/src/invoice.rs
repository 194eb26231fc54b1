//! # Invoice Item Logic
//!
//! The invoice write path is the one place in Faktur with multi-step
//! validation and a derived aggregate that must stay consistent with a
//! mutable child collection. Everything pure about it lives here; the
//! database side (existence checks, transactional apply) lives in
//! `faktur-db::repository::invoice`.
//!
//! ## Validation Sequence (fail-fast, first violation wins)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. customer_id present          → "Customer ID is required"            │
//! │  2. items present and non-empty  → "At least one invoice item ..."      │
//! │  3. no duplicate product ids     → "Duplicate product IDs ..."          │
//! │  4. per item (1-based index):                                           │
//! │       product_id/price/quantity present → "Item i: ... are required"    │
//! │       price > 0 and quantity > 0        → "Item i: ... greater than 0"  │
//! │  ── everything below needs the database ──                              │
//! │  5. customer resolves to an active row                                  │
//! │  6. every product resolves to an active row                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Replace-by-Diff on Update
//! The submitted item set is the invoice's desired FINAL state, not a delta.
//! Items carrying an `item_id` update in place; items without one insert;
//! currently-active items absent from the submitted set are soft-deleted.
//! [`plan_update`] computes that partition as a pure function of the
//! current-active id snapshot, so the transaction in faktur-db only has to
//! execute the plan.

use serde::Deserialize;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Input Types
// =============================================================================

/// A line item exactly as submitted by the client, before validation.
///
/// All fields are optional so that "field missing" can be reported per item
/// with its 1-based index rather than failing JSON deserialization wholesale.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemInput {
    /// Present on update requests for items that already exist.
    pub item_id: Option<i64>,
    pub product_id: Option<i64>,
    pub price_cents: Option<i64>,
    pub quantity: Option<i64>,
}

/// A validated line item: every mandatory field present and positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSubmission {
    /// `Some` marks an existing item to update in place, `None` a new insert.
    pub item_id: Option<i64>,
    pub product_id: i64,
    pub price_cents: i64,
    pub quantity: i64,
}

impl ItemSubmission {
    /// Line total, computed from the submitted (snapshotted) price.
    ///
    /// The price is deliberately NOT re-read from the product catalog:
    /// an invoice records what was charged, not what the catalog says today.
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.price_cents) * self.quantity
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Validates a submitted item collection (steps 2-4 of the sequence).
///
/// Used verbatim by both create and update: update requests simply arrive
/// with some `item_id`s set.
pub fn validate_items(items: &[ItemInput]) -> CoreResult<Vec<ItemSubmission>> {
    if items.is_empty() {
        return Err(CoreError::ItemsRequired);
    }

    // Duplicate check runs over the product ids that were actually supplied;
    // a missing product_id is reported by the per-item check below instead.
    let mut seen: Vec<i64> = Vec::with_capacity(items.len());
    for item in items {
        if let Some(product_id) = item.product_id {
            if seen.contains(&product_id) {
                return Err(CoreError::DuplicateProducts);
            }
            seen.push(product_id);
        }
    }

    let mut validated = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let index = i + 1;

        let (product_id, price_cents, quantity) =
            match (item.product_id, item.price_cents, item.quantity) {
                (Some(p), Some(pr), Some(q)) => (p, pr, q),
                _ => return Err(CoreError::ItemFieldsRequired { index }),
            };

        if price_cents <= 0 || quantity <= 0 {
            return Err(CoreError::ItemNotPositive { index });
        }

        validated.push(ItemSubmission {
            item_id: item.item_id,
            product_id,
            price_cents,
            quantity,
        });
    }

    Ok(validated)
}

/// Grand total over a validated item set.
///
/// Computed in application code from the submitted values - the persisted
/// invoice row must carry this before any reader sees it.
pub fn grand_total(items: &[ItemSubmission]) -> Money {
    items.iter().map(ItemSubmission::line_total).sum()
}

// =============================================================================
// Replace-by-Diff Planning
// =============================================================================

/// The mutation plan for one invoice update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPlan {
    /// Existing items to update in place (item_id is always `Some`).
    pub updates: Vec<ItemSubmission>,
    /// New items to insert.
    pub inserts: Vec<ItemSubmission>,
    /// Currently-active item ids absent from the submitted set: soft-delete.
    pub removals: Vec<i64>,
}

/// Partitions a validated submission against the current-active id snapshot.
///
/// `current_active` must be read inside the same transaction that executes
/// the plan - it is the transaction's snapshot, and the race between two
/// concurrent updates computing removals from stale reads is closed by that
/// transaction, not by this function.
///
/// Fails with [`CoreError::ItemNotInInvoice`] when the submission claims an
/// item id that is not active on this invoice (deleted, foreign, or made up).
pub fn plan_update(current_active: &[i64], submitted: Vec<ItemSubmission>) -> CoreResult<ItemPlan> {
    let mut updates = Vec::new();
    let mut inserts = Vec::new();

    for item in submitted {
        match item.item_id {
            Some(item_id) => {
                if !current_active.contains(&item_id) {
                    return Err(CoreError::ItemNotInInvoice { item_id });
                }
                updates.push(item);
            }
            None => inserts.push(item),
        }
    }

    let removals = current_active
        .iter()
        .copied()
        .filter(|id| !updates.iter().any(|u| u.item_id == Some(*id)))
        .collect();

    Ok(ItemPlan {
        updates,
        inserts,
        removals,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(product_id: i64, price_cents: i64, quantity: i64) -> ItemInput {
        ItemInput {
            item_id: None,
            product_id: Some(product_id),
            price_cents: Some(price_cents),
            quantity: Some(quantity),
        }
    }

    fn submitted(
        item_id: Option<i64>,
        product_id: i64,
        price_cents: i64,
        quantity: i64,
    ) -> ItemSubmission {
        ItemSubmission {
            item_id,
            product_id,
            price_cents,
            quantity,
        }
    }

    #[test]
    fn test_empty_items_rejected() {
        assert_eq!(validate_items(&[]), Err(CoreError::ItemsRequired));
    }

    #[test]
    fn test_duplicate_products_rejected_before_field_checks() {
        // Second entry is missing its quantity, but the duplicate check
        // fires first - mirroring the documented sequence.
        let items = vec![
            raw(7, 1000, 2),
            ItemInput {
                item_id: None,
                product_id: Some(7),
                price_cents: Some(500),
                quantity: None,
            },
        ];
        assert_eq!(validate_items(&items), Err(CoreError::DuplicateProducts));
    }

    #[test]
    fn test_missing_fields_reported_with_one_based_index() {
        let items = vec![
            raw(1, 1000, 2),
            ItemInput {
                item_id: None,
                product_id: Some(2),
                price_cents: None,
                quantity: Some(1),
            },
        ];
        assert_eq!(
            validate_items(&items),
            Err(CoreError::ItemFieldsRequired { index: 2 })
        );
    }

    #[test]
    fn test_non_positive_rejected() {
        assert_eq!(
            validate_items(&[raw(1, 0, 2)]),
            Err(CoreError::ItemNotPositive { index: 1 })
        );
        assert_eq!(
            validate_items(&[raw(1, 1000, -1)]),
            Err(CoreError::ItemNotPositive { index: 1 })
        );
    }

    #[test]
    fn test_valid_items_pass_through() {
        let validated = validate_items(&[raw(1, 1000, 2), raw(2, 500, 1)]).unwrap();
        assert_eq!(validated.len(), 2);
        assert_eq!(validated[0].line_total(), Money::from_cents(2000));
    }

    #[test]
    fn test_grand_total() {
        // price 10.00 × 2 + price 5.00 × 1 = 25.00
        let items = vec![submitted(None, 1, 1000, 2), submitted(None, 2, 500, 1)];
        assert_eq!(grand_total(&items), Money::from_cents(2500));
    }

    #[test]
    fn test_plan_partitions_updates_inserts_removals() {
        let current = vec![10, 11, 12];
        let submitted_items = vec![
            submitted(Some(10), 1, 1000, 2), // keep, update
            submitted(None, 3, 700, 1),      // new
        ];

        let plan = plan_update(&current, submitted_items).unwrap();
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].item_id, Some(10));
        assert_eq!(plan.inserts.len(), 1);
        assert_eq!(plan.inserts[0].product_id, 3);
        // 11 and 12 were not resubmitted: scheduled for soft deletion.
        assert_eq!(plan.removals, vec![11, 12]);
    }

    #[test]
    fn test_plan_keeps_everything_when_all_resubmitted() {
        let current = vec![10, 11];
        let submitted_items = vec![
            submitted(Some(10), 1, 1000, 2),
            submitted(Some(11), 2, 500, 1),
        ];

        let plan = plan_update(&current, submitted_items).unwrap();
        assert!(plan.removals.is_empty());
        assert!(plan.inserts.is_empty());
        assert_eq!(plan.updates.len(), 2);
    }

    #[test]
    fn test_plan_rejects_foreign_item_id() {
        let plan = plan_update(&[10], vec![submitted(Some(99), 1, 1000, 1)]);
        assert_eq!(plan, Err(CoreError::ItemNotInInvoice { item_id: 99 }));
    }
}

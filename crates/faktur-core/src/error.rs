//! # Error Types
//!
//! Domain-specific error types for faktur-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  faktur-core errors (this file)                                        │
//! │  ├── CoreError        - Invoice workflow rule violations               │
//! │  └── ValidationError  - Field-level input validation failures          │
//! │                                                                         │
//! │  faktur-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  API errors (apps/api)                                                 │
//! │  └── ApiError         - HTTP status + JSON body the client sees        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Error display strings ARE the client-facing messages - wording matters
//! 3. Errors are enum variants, never bare Strings

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Invoice workflow rule violations.
///
/// Display strings are returned verbatim in `{"error": "..."}` bodies, so
/// they are written as full sentences addressed to the API consumer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// An invoice cannot be created without a customer reference.
    #[error("Customer ID is required")]
    CustomerRequired,

    /// An invoice must always carry at least one line item.
    #[error("At least one invoice item is required")]
    ItemsRequired,

    /// Two submitted items reference the same product.
    #[error("Duplicate product IDs are not allowed in the same invoice")]
    DuplicateProducts,

    /// A submitted item is missing one of its three mandatory fields.
    /// `index` is 1-based, matching the position in the request body.
    #[error("Item {index}: product_id, price, and quantity are required")]
    ItemFieldsRequired { index: usize },

    /// A submitted item carries a non-positive price or quantity.
    #[error("Item {index}: price and quantity must be greater than 0")]
    ItemNotPositive { index: usize },

    /// An update claimed an item id that is not an active item of the
    /// invoice being updated (wrong invoice, already deleted, or never
    /// existed - indistinguishable on purpose).
    #[error("Item with ID {item_id} not found in this invoice")]
    ItemNotInInvoice { item_id: i64 },

    /// Field-level validation failure (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field-level input validation errors.
///
/// Used for early validation before any business logic or storage call runs.
/// The `field` strings are human-readable ("Customer name", not a column
/// name) because the display text goes straight to the client.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// A provided field may not be blanked out.
    #[error("{field} cannot be empty")]
    Empty { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be less than or equal to {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be greater than 0")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (contact digits, email shape).
    #[error("{reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

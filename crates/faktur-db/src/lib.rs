//! # faktur-db: Database Layer for Faktur
//!
//! This crate provides database access for the Faktur invoicing back office.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Faktur Data Flow                                 │
//! │                                                                         │
//! │  Axum handler (add_invoice)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     faktur-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ customer.rs   │    │  (embedded)  │  │   │
//! │  │   │               │    │ product.rs    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ user.rs       │    │ 001_initial_ │  │   │
//! │  │   │ Lifecycle     │    │ invoice.rs    │    │  schema.sql  │  │   │
//! │  │   │               │    │ token.rs      │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │                     SQLite database (WAL mode)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and explicit lifecycle
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations per entity
//!
//! ## Soft Deletion
//!
//! Every business table carries `is_active`. Soft delete is the only delete
//! path, and every existence/uniqueness/list query filters on `is_active = 1`
//! consistently - a row flipped inactive disappears from the API without its
//! history (invoice items, old contacts) going anywhere.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::customer::{Customer, CustomerPatch, CustomerRepository, NewCustomer};
pub use repository::invoice::{
    Invoice, InvoiceHeaderPatch, InvoiceItem, InvoiceItemDetail, InvoiceRepository,
    InvoiceSummary,
};
pub use repository::product::{NewProduct, Product, ProductPatch, ProductRepository};
pub use repository::token::{RefreshToken, RefreshTokenRepository};
pub use repository::user::{NewUser, User, UserPatch, UserRepository};

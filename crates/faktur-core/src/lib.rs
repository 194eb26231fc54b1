//! # faktur-core: Pure Business Logic for Faktur
//!
//! This crate is the heart of the Faktur invoicing back office. It contains
//! all business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Faktur Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    React Admin UI                               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ REST / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    Axum Handlers (apps/api)                     │   │
//! │  │    login, customer CRUD, product CRUD, invoice workflow         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ faktur-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │  invoice  │  │ validation│  │   error   │  │   │
//! │  │   │   Money   │  │ item set  │  │  field    │  │  typed    │  │   │
//! │  │   │  (cents)  │  │ diff plan │  │  rules    │  │  errors   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    faktur-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`invoice`] - Invoice item validation and replace-by-diff planning
//! - [`validation`] - Field-level validation rules per entity
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod invoice;
pub mod money;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use invoice::{ItemInput, ItemPlan, ItemSubmission};
pub use money::Money;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Placeholder stored for optional text fields the client left blank.
///
/// The admin UI renders this literally, so it is part of the wire contract:
/// a customer without an email has `customer_email = "NA"`, not null.
pub const NA_PLACEHOLDER: &str = "NA";

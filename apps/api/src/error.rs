//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Faktur                                 │
//! │                                                                         │
//! │  Handler                                                                │
//! │     │                                                                   │
//! │     ├── ValidationError / CoreError ── 400 {"error": message}           │
//! │     │                                                                   │
//! │     ├── DbError::NotFound ──────────── 404 (or 400 at invoice call     │
//! │     │                                   sites - handlers remap)         │
//! │     ├── DbError::UniqueViolation ───── 409                              │
//! │     │                                                                   │
//! │     └── any other DbError ──────────── logged, 500 generic body         │
//! │                                                                         │
//! │  Every handler maps its own failures; there is no blanket middleware.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Referential errors are call-site dependent: a missing customer is 404
//! when you GET it, but 400 when an invoice submission references it. The
//! blanket `From` impls cover the common case and invoice handlers remap.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use faktur_core::{CoreError, ValidationError};
use faktur_db::DbError;

/// An HTTP error response: status code plus the `{"error": ...}` body.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }

    /// 400 validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, message)
    }

    /// 404 not-found-or-inactive.
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::NOT_FOUND, message)
    }

    /// 409 duplicate on a unique natural key.
    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::CONFLICT, message)
    }

    /// 401 authentication failure.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::UNAUTHORIZED, message)
    }

    /// 500 with the generic body; the real cause is logged, never leaked.
    pub fn internal() -> Self {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Field-level validation failures are always 400s.
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Invoice workflow rule violations are 400s, except the item-membership
/// check, which reports a missing resource and is a 404.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ItemNotInInvoice { .. } => ApiError::not_found(err.to_string()),
            other => ApiError::validation(other.to_string()),
        }
    }
}

/// Default database error mapping. Handlers with call-site-specific status
/// codes (the invoice write path) match on DbError themselves instead.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, .. } => {
                ApiError::not_found(format!("{} not found", entity))
            }
            DbError::UniqueViolation { .. } => ApiError::conflict(err.to_string()),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!(message = %message, "Foreign key violation");
                ApiError::validation("Invalid reference")
            }
            other => {
                tracing::error!(error = %other, "Database error");
                ApiError::internal()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_not_found_maps_to_404() {
        let api: ApiError = DbError::not_found("Customer", 7).into();
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.message, "Customer not found");
    }

    #[test]
    fn test_unique_violation_maps_to_409() {
        let api: ApiError = DbError::duplicate("users.email", "a@b.com").into();
        assert_eq!(api.status, StatusCode::CONFLICT);
    }

    #[test]
    fn test_core_item_membership_maps_to_404() {
        let api: ApiError = CoreError::ItemNotInInvoice { item_id: 3 }.into();
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.message, "Item with ID 3 not found in this invoice");
    }

    #[test]
    fn test_internal_error_body_is_generic() {
        let api: ApiError = DbError::QueryFailed("secret table missing".to_string()).into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "Internal server error");
    }
}

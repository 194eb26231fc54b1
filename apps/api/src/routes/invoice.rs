//! Invoice handlers - the orchestration side of the core workflow.
//!
//! The division of labor:
//! - Shape validation (presence, duplicates, positivity) runs here via
//!   `faktur_core::invoice::validate_items`, before any database call.
//! - Referential checks and the actual writes run inside the repository's
//!   transaction; their failures come back as `DbError::NotFound` and are
//!   remapped here to the call-site status codes (missing customer/product
//!   during an invoice write is the CLIENT's 400, not a 404).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use faktur_core::invoice::{validate_items, ItemInput};
use faktur_core::CoreError;
use faktur_db::{DbError, InvoiceHeaderPatch, InvoiceItem, InvoiceItemDetail, InvoiceSummary};

use crate::error::ApiError;
use crate::AppState;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Serialize)]
pub struct InvoiceSummaryDto {
    pub invoice_id: i64,
    pub customer_id: i64,
    pub customer_name: String,
    pub customer_contact: String,
    pub invoice_date: NaiveDate,
    pub grand_total_cents: i64,
}

impl From<InvoiceSummary> for InvoiceSummaryDto {
    fn from(summary: InvoiceSummary) -> Self {
        InvoiceSummaryDto {
            invoice_id: summary.id,
            customer_id: summary.customer_id,
            customer_name: summary.customer_name,
            customer_contact: summary.customer_contact,
            invoice_date: summary.invoice_date,
            grand_total_cents: summary.grand_total_cents,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceItemDto {
    pub item_id: i64,
    pub product_id: i64,
    pub price_cents: i64,
    pub quantity: i64,
    pub total_cents: i64,
}

impl From<InvoiceItem> for InvoiceItemDto {
    fn from(item: InvoiceItem) -> Self {
        InvoiceItemDto {
            item_id: item.id,
            product_id: item.product_id,
            price_cents: item.price_cents,
            quantity: item.quantity,
            total_cents: item.total_cents,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceItemDetailDto {
    pub item_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_description: String,
    pub price_cents: i64,
    pub quantity: i64,
    pub total_cents: i64,
}

impl From<InvoiceItemDetail> for InvoiceItemDetailDto {
    fn from(item: InvoiceItemDetail) -> Self {
        InvoiceItemDetailDto {
            item_id: item.id,
            product_id: item.product_id,
            product_name: item.product_name,
            product_description: item.product_description,
            price_cents: item.price_cents,
            quantity: item.quantity,
            total_cents: item.total_cents,
        }
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Call-site mapping for invoice write failures.
///
/// Referenced customers/products that don't resolve are a 400 (the client
/// submitted a bad reference); the invoice itself or a claimed item missing
/// is a 404.
fn invoice_write_error(err: DbError) -> ApiError {
    match err {
        DbError::NotFound { ref entity, .. } if entity == "Customer" => {
            ApiError::validation("Customer not found")
        }
        DbError::NotFound { ref entity, ref id } if entity == "Product" => {
            ApiError::validation(format!("Product with ID {} not found", id))
        }
        DbError::NotFound { ref entity, ref id } if entity == "Item" => {
            ApiError::not_found(format!("Item with ID {} not found in this invoice", id))
        }
        DbError::NotFound { ref entity, .. } if entity == "Invoice" => {
            ApiError::not_found("Invoice not found")
        }
        other => other.into(),
    }
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AddInvoiceRequest {
    pub customer_id: Option<i64>,
    pub invoice_date: Option<NaiveDate>,
    pub items: Option<Vec<ItemInput>>,
}

/// `POST /invoice/add`
pub async fn add_invoice(
    State(state): State<AppState>,
    Json(body): Json<AddInvoiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let customer_id = body.customer_id.ok_or(CoreError::CustomerRequired)?;

    let raw_items = body.items.unwrap_or_default();
    let items = validate_items(&raw_items)?;

    // Date defaults to today when the client omits it.
    let invoice_date = body.invoice_date.unwrap_or_else(|| Utc::now().date_naive());

    let (invoice, created_items) = state
        .db
        .invoices()
        .create(customer_id, invoice_date, &items)
        .await
        .map_err(invoice_write_error)?;

    info!(invoice_id = %invoice.id, "Invoice created via API");

    let items: Vec<InvoiceItemDto> = created_items.into_iter().map(InvoiceItemDto::from).collect();
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Invoice created successfully",
            "invoice": {
                "invoice_id": invoice.id,
                "customer_id": invoice.customer_id,
                "invoice_date": invoice.invoice_date,
                "grand_total_cents": invoice.grand_total_cents,
                "items": items,
            }
        })),
    ))
}

/// `GET /invoice`
pub async fn list_invoices(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let invoices = state.db.invoices().list_active().await?;

    let message = if invoices.is_empty() {
        "No invoices found"
    } else {
        "Invoices retrieved successfully"
    };
    let invoices: Vec<InvoiceSummaryDto> =
        invoices.into_iter().map(InvoiceSummaryDto::from).collect();

    Ok(Json(json!({
        "message": message,
        "count": invoices.len(),
        "invoices": invoices,
    })))
}

/// `GET /invoice/{id}`
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .db
        .invoices()
        .get_active(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Invoice not found"))?;

    let items = state.db.invoices().get_items(id).await?;
    let items: Vec<InvoiceItemDetailDto> =
        items.into_iter().map(InvoiceItemDetailDto::from).collect();

    let summary = InvoiceSummaryDto::from(summary);
    Ok(Json(json!({
        "invoice": {
            "invoice_id": summary.invoice_id,
            "customer_id": summary.customer_id,
            "customer_name": summary.customer_name,
            "customer_contact": summary.customer_contact,
            "invoice_date": summary.invoice_date,
            "grand_total_cents": summary.grand_total_cents,
            "items": items,
        }
    })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateInvoiceRequest {
    pub customer_id: Option<i64>,
    pub invoice_date: Option<NaiveDate>,
    pub items: Option<Vec<ItemInput>>,
}

/// `PUT /invoice/updateInvoice/{id}`
///
/// Any subset of {customer_id, invoice_date, items} may be provided. A
/// submitted items collection is the invoice's desired final state - see
/// the repository documentation for the replace-by-diff semantics.
pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateInvoiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let header = InvoiceHeaderPatch {
        customer_id: body.customer_id,
        invoice_date: body.invoice_date,
    };

    // Items get the same shape validation as creation; existing items are
    // recognized by their item_id.
    let validated_items = match &body.items {
        Some(raw) => Some(validate_items(raw)?),
        None => None,
    };

    state
        .db
        .invoices()
        .update(id, &header, validated_items.as_deref())
        .await
        .map_err(invoice_write_error)?;

    info!(invoice_id = %id, "Invoice updated via API");
    Ok(Json(json!({ "message": "Invoice updated successfully" })))
}

/// `PUT /invoice/deleteInvoice/{id}`
pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let items_deleted = state
        .db
        .invoices()
        .soft_delete(id)
        .await
        .map_err(|e| match e {
            DbError::NotFound { .. } => ApiError::not_found("Invoice not found"),
            other => other.into(),
        })?;

    info!(invoice_id = %id, items_deleted, "Invoice deleted via API");
    Ok(Json(json!({
        "message": "Invoice deleted successfully",
        "items_deleted": items_deleted,
    })))
}

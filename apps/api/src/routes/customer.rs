//! Customer CRUD handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use faktur_core::validation::{
    normalize_optional_text, validate_customer_contact, validate_customer_name,
    validate_optional_email,
};
use faktur_db::{Customer, CustomerPatch, NewCustomer};

use crate::error::ApiError;
use crate::AppState;

/// Customer as the admin UI sees it.
#[derive(Debug, Serialize)]
pub struct CustomerDto {
    pub customer_id: i64,
    pub customer_name: String,
    pub customer_contact: String,
    pub customer_email: String,
    pub customer_address: String,
}

impl From<Customer> for CustomerDto {
    fn from(customer: Customer) -> Self {
        CustomerDto {
            customer_id: customer.id,
            customer_name: customer.name,
            customer_contact: customer.contact,
            customer_email: customer.email,
            customer_address: customer.address,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddCustomerRequest {
    pub customer_name: Option<String>,
    pub customer_contact: Option<String>,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
}

/// `POST /customer/add`
pub async fn add_customer(
    State(state): State<AppState>,
    Json(body): Json<AddCustomerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = validate_customer_name(body.customer_name.as_deref().unwrap_or(""))?;
    let contact = validate_customer_contact(body.customer_contact.as_deref().unwrap_or(""))?;
    let email =
        validate_optional_email("Customer email", body.customer_email.as_deref().unwrap_or(""))?;
    let address = normalize_optional_text(body.customer_address.as_deref().unwrap_or(""));

    // Only ACTIVE rows block the contact - a soft-deleted customer's number
    // is free to reuse.
    if state
        .db
        .customers()
        .find_active_by_contact(&contact, None)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict(
            "Customer with this contact already exists and is active",
        ));
    }

    let customer = state
        .db
        .customers()
        .insert(&NewCustomer {
            name,
            contact,
            email,
            address,
        })
        .await?;

    info!(customer_id = %customer.id, "Customer added");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Customer added successfully",
            "customer": CustomerDto::from(customer),
        })),
    ))
}

/// `GET /customer`
pub async fn list_customers(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let customers = state.db.customers().list_active().await?;
    let customers: Vec<CustomerDto> = customers.into_iter().map(CustomerDto::from).collect();

    Ok(Json(json!({ "customers": customers })))
}

/// `GET /customer/{id}`
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = state
        .db
        .customers()
        .get_active(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer not found"))?;

    Ok(Json(CustomerDto::from(customer)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateCustomerRequest {
    pub customer_name: Option<String>,
    pub customer_contact: Option<String>,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
}

/// `PUT /customer/updateCustomer/{id}`
///
/// Each provided field is validated and applied independently; omitted
/// fields are untouched.
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateCustomerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if state.db.customers().get_active(id).await?.is_none() {
        return Err(ApiError::not_found("Customer not found"));
    }

    let mut patch = CustomerPatch::default();

    if let Some(name) = &body.customer_name {
        if name.trim().is_empty() {
            return Err(ApiError::validation("Customer name cannot be empty"));
        }
        patch.name = Some(validate_customer_name(name)?);
    }

    if let Some(contact) = &body.customer_contact {
        if contact.trim().is_empty() {
            return Err(ApiError::validation("Customer contact cannot be empty"));
        }
        let contact = validate_customer_contact(contact)?;

        if state
            .db
            .customers()
            .find_active_by_contact(&contact, Some(id))
            .await?
            .is_some()
        {
            return Err(ApiError::conflict(
                "Another customer with this contact already exists",
            ));
        }
        patch.contact = Some(contact);
    }

    if let Some(email) = &body.customer_email {
        patch.email = Some(validate_optional_email("Customer email", email)?);
    }

    if let Some(address) = &body.customer_address {
        patch.address = Some(normalize_optional_text(address));
    }

    if patch.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    state.db.customers().update(id, &patch).await?;

    info!(customer_id = %id, "Customer updated");
    Ok(Json(json!({ "message": "Customer updated successfully" })))
}

/// `PUT /customer/deleteCustomer/{id}`
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .customers()
        .soft_delete(id)
        .await
        .map_err(|e| match e {
            faktur_db::DbError::NotFound { .. } => ApiError::not_found("Customer not found"),
            other => other.into(),
        })?;

    info!(customer_id = %id, "Customer deleted");
    Ok(Json(json!({ "message": "Customer deleted successfully" })))
}

//! Product CRUD handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use faktur_core::validation::{
    normalize_optional_text, validate_product_name, validate_product_price_cents,
};
use faktur_db::{NewProduct, Product, ProductPatch};

use crate::error::ApiError;
use crate::AppState;

/// Product as the admin UI sees it.
#[derive(Debug, Serialize)]
pub struct ProductDto {
    pub product_id: i64,
    pub product_name: String,
    pub product_description: String,
    pub product_price_cents: i64,
}

impl From<Product> for ProductDto {
    fn from(product: Product) -> Self {
        ProductDto {
            product_id: product.id,
            product_name: product.name,
            product_description: product.description,
            product_price_cents: product.price_cents,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddProductRequest {
    pub product_name: Option<String>,
    pub product_description: Option<String>,
    pub product_price_cents: Option<i64>,
}

/// `POST /product/add`
pub async fn add_product(
    State(state): State<AppState>,
    Json(body): Json<AddProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = validate_product_name(body.product_name.as_deref().unwrap_or(""))?;
    let description = normalize_optional_text(body.product_description.as_deref().unwrap_or(""));
    let price_cents = validate_product_price_cents(body.product_price_cents.unwrap_or(0))?;

    if state
        .db
        .products()
        .find_active_by_name(&name, None)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict("Product with this name already exists"));
    }

    let product = state
        .db
        .products()
        .insert(&NewProduct {
            name,
            description,
            price_cents,
        })
        .await?;

    info!(product_id = %product.id, "Product added");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Product added successfully",
            "product": ProductDto::from(product),
        })),
    ))
}

/// `GET /product`
pub async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let products = state.db.products().list_active().await?;
    let products: Vec<ProductDto> = products.into_iter().map(ProductDto::from).collect();

    Ok(Json(json!({ "products": products })))
}

/// `GET /product/{id}`
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .db
        .products()
        .get_active(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    Ok(Json(ProductDto::from(product)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub product_name: Option<String>,
    pub product_description: Option<String>,
    pub product_price_cents: Option<i64>,
}

/// `PUT /product/{id}`
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if state.db.products().get_active(id).await?.is_none() {
        return Err(ApiError::not_found("Product not found"));
    }

    let mut patch = ProductPatch::default();

    if let Some(name) = &body.product_name {
        if name.trim().is_empty() {
            return Err(ApiError::validation("Product name cannot be empty"));
        }
        let name = validate_product_name(name)?;

        if state
            .db
            .products()
            .find_active_by_name(&name, Some(id))
            .await?
            .is_some()
        {
            return Err(ApiError::conflict(
                "Another product with this name already exists",
            ));
        }
        patch.name = Some(name);
    }

    if let Some(description) = &body.product_description {
        patch.description = Some(normalize_optional_text(description));
    }

    if let Some(price_cents) = body.product_price_cents {
        patch.price_cents = Some(validate_product_price_cents(price_cents)?);
    }

    if patch.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    state.db.products().update(id, &patch).await?;

    info!(product_id = %id, "Product updated");
    Ok(Json(json!({ "message": "Product updated successfully" })))
}

/// `PUT /product/deleteProduct/{id}`
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .products()
        .soft_delete(id)
        .await
        .map_err(|e| match e {
            faktur_db::DbError::NotFound { .. } => ApiError::not_found("Product not found"),
            other => other.into(),
        })?;

    info!(product_id = %id, "Product deleted");
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}

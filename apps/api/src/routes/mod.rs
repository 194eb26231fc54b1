//! # Route Assembly
//!
//! One module per entity, mirroring the URL surface the admin UI consumes.
//! Everything except `/login` and `/token/refresh` sits behind the bearer
//! token middleware.

pub mod auth;
pub mod customer;
pub mod invoice;
pub mod product;
pub mod user;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;

use crate::middleware::require_auth;
use crate::AppState;

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        // Customers
        .route("/customer/add", post(customer::add_customer))
        .route("/customer", get(customer::list_customers))
        .route("/customer/{id}", get(customer::get_customer))
        .route("/customer/updateCustomer/{id}", put(customer::update_customer))
        .route("/customer/deleteCustomer/{id}", put(customer::delete_customer))
        // Products
        .route("/product/add", post(product::add_product))
        .route("/product", get(product::list_products))
        .route("/product/{id}", get(product::get_product).put(product::update_product))
        .route("/product/deleteProduct/{id}", put(product::delete_product))
        // Invoices
        .route("/invoice/add", post(invoice::add_invoice))
        .route("/invoice", get(invoice::list_invoices))
        .route("/invoice/{id}", get(invoice::get_invoice))
        .route("/invoice/updateInvoice/{id}", put(invoice::update_invoice))
        .route("/invoice/deleteInvoice/{id}", put(invoice::delete_invoice))
        // Users
        .route("/user/add", post(user::add_user))
        .route("/user", get(user::list_users))
        .route("/user/{id}", get(user::get_user).put(user::update_user))
        .route("/user/deleteUser/{id}", put(user::delete_user))
        .layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/login", post(auth::login))
        .route("/token/refresh", post(auth::refresh_token))
        .merge(protected)
        .with_state(state)
}

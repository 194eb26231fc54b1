//! Bearer-token authentication middleware.
//!
//! Guards every route except `/login` and `/token/refresh`. On success the
//! decoded claims are attached to the request extensions; handlers that care
//! about the caller identity can extract them.
//!
//! Middleware failures use `{"message": ...}` bodies (the handlers use
//! `{"error": ...}`) - the admin UI distinguishes "clear credentials and
//! redirect to login" from ordinary request errors by that shape.

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::debug;

use crate::auth::{extract_bearer_token, AuthError};
use crate::AppState;

/// Rejects the request unless it carries a valid bearer access token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let header_value = match auth_header {
        Some(value) => value,
        None => return unauthorized("Access denied, token missing"),
    };

    let token = match extract_bearer_token(header_value) {
        Some(token) => token,
        None => return unauthorized("Access denied, invalid token format"),
    };

    match state.jwt.validate_access_token(token) {
        Ok(claims) => {
            debug!(user_id = %claims.sub, "Authenticated request");
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(AuthError::Expired) => unauthorized("Token expired"),
        Err(AuthError::Invalid) => unauthorized("Invalid token"),
    }
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": message }))).into_response()
}

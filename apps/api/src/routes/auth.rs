//! Login and refresh token handlers.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use faktur_db::DbError;

use crate::auth::{generate_refresh_token, hash_refresh_token, verify_password};
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// `POST /login` - credentials in, access token + rotating refresh token out.
///
/// Unknown email and wrong password produce the same response on purpose:
/// the login form must not leak which accounts exist.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (email, password) = match (&body.email, &body.password) {
        (Some(email), Some(password))
            if !email.trim().is_empty() && !password.trim().is_empty() =>
        {
            (email.trim().to_lowercase(), password.trim().to_string())
        }
        _ => return Err(ApiError::validation("Email and password are required")),
    };

    let user = match state.db.users().find_active_by_email(&email).await? {
        Some(user) => user,
        None => {
            warn!(email = %email, "Login attempt for unknown or inactive user");
            return Err(ApiError::unauthorized("Invalid email or password"));
        }
    };

    if !verify_password(&password, &user.password_hash) {
        warn!(user_id = %user.id, "Login attempt with wrong password");
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let access_token = state
        .jwt
        .generate_access_token(user.id, &user.username)
        .map_err(|e| {
            error!(?e, "Failed to sign access token");
            ApiError::internal()
        })?;

    let refresh_token = generate_refresh_token();
    let expires_at = Utc::now() + Duration::seconds(state.config.refresh_lifetime_secs);
    state
        .db
        .refresh_tokens()
        .insert(user.id, &hash_refresh_token(&refresh_token), expires_at)
        .await?;

    info!(user_id = %user.id, "User logged in");

    Ok(Json(json!({
        "message": "Logged in successfully",
        "accessToken": access_token,
        "refreshToken": refresh_token,
        "user": {
            "user_id": user.id,
            "username": user.username,
            "email": user.email,
        }
    })))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// `POST /token/refresh` - rotates the presented refresh token and issues a
/// fresh access token.
///
/// Unknown, expired, and already-consumed tokens all answer the same 401;
/// a consumed token replayed here must never mint anything.
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let presented = body
        .refresh_token
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| ApiError::validation("Refresh token required"))?;

    let digest = hash_refresh_token(presented.trim());

    let stored = match state.db.refresh_tokens().find_by_hash(&digest).await? {
        Some(stored) => stored,
        None => return Err(ApiError::unauthorized("Invalid or expired refresh token")),
    };

    if stored.is_expired(Utc::now()) {
        state.db.refresh_tokens().delete_by_hash(&digest).await?;
        return Err(ApiError::unauthorized("Invalid or expired refresh token"));
    }

    let user = state
        .db
        .users()
        .get_active(stored.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired refresh token"))?;

    let new_refresh = generate_refresh_token();
    let expires_at = Utc::now() + Duration::seconds(state.config.refresh_lifetime_secs);
    state
        .db
        .refresh_tokens()
        .rotate(&digest, user.id, &hash_refresh_token(&new_refresh), expires_at)
        .await
        .map_err(|e| match e {
            // Lost the race against another rotation of the same token.
            DbError::NotFound { .. } => ApiError::unauthorized("Invalid or expired refresh token"),
            other => other.into(),
        })?;

    let access_token = state
        .jwt
        .generate_access_token(user.id, &user.username)
        .map_err(|e| {
            error!(?e, "Failed to sign access token");
            ApiError::internal()
        })?;

    info!(user_id = %user.id, "Refresh token rotated");

    Ok(Json(json!({
        "message": "Token refreshed successfully",
        "accessToken": access_token,
        "refreshToken": new_refresh,
    })))
}

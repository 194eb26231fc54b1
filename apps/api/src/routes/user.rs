//! User CRUD handlers.
//!
//! Passwords are hashed before they leave this module; the stored hash never
//! appears in any response body.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use faktur_core::validation::{validate_password, validate_user_email, validate_username};
use faktur_db::{DbError, NewUser, User, UserPatch};

use crate::auth::hash_password;
use crate::error::ApiError;
use crate::AppState;

/// User as the admin UI sees it - no hash, no flags.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub user_id: i64,
    pub username: String,
    pub email: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            user_id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// `POST /user/add`
pub async fn add_user(
    State(state): State<AppState>,
    Json(body): Json<AddUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = validate_username(body.username.as_deref().unwrap_or(""))?;
    let email = validate_user_email(body.email.as_deref().unwrap_or(""))?;
    let password = validate_password(body.password.as_deref().unwrap_or(""))?;

    let password_hash = hash_password(&password).map_err(|_| ApiError::internal())?;

    let user = state
        .db
        .users()
        .insert(&NewUser {
            username,
            email,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            DbError::UniqueViolation { .. } => {
                ApiError::conflict("User with this email already exists")
            }
            other => other.into(),
        })?;

    info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": UserDto::from(user),
        })),
    ))
}

/// `GET /user`
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.db.users().list_active().await?;
    let users: Vec<UserDto> = users.into_iter().map(UserDto::from).collect();

    Ok(Json(json!({ "users": users })))
}

/// `GET /user/{id}`
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .users()
        .get_active(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserDto::from(user)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// `PUT /user/{id}`
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if state.db.users().get_active(id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let mut patch = UserPatch::default();

    if let Some(username) = &body.username {
        if username.trim().is_empty() {
            return Err(ApiError::validation("Username cannot be empty"));
        }
        patch.username = Some(validate_username(username)?);
    }

    if let Some(email) = &body.email {
        if email.trim().is_empty() {
            return Err(ApiError::validation("Email cannot be empty"));
        }
        patch.email = Some(validate_user_email(email)?);
    }

    if let Some(password) = &body.password {
        if password.trim().is_empty() {
            return Err(ApiError::validation("Password cannot be empty"));
        }
        let password = validate_password(password)?;
        patch.password_hash = Some(hash_password(&password).map_err(|_| ApiError::internal())?);
    }

    if patch.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    state.db.users().update(id, &patch).await.map_err(|e| match e {
        // The schema-level UNIQUE on email backs up the application check.
        DbError::UniqueViolation { .. } => {
            ApiError::conflict("Another user with this email already exists")
        }
        other => other.into(),
    })?;

    info!(user_id = %id, "User updated");
    Ok(Json(json!({ "message": "User updated successfully" })))
}

/// `PUT /user/deleteUser/{id}`
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.users().soft_delete(id).await.map_err(|e| match e {
        DbError::NotFound { .. } => ApiError::not_found("User not found"),
        other => other.into(),
    })?;

    info!(user_id = %id, "User deleted");
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

//! # User Repository
//!
//! Database operations for back-office users. Emails are unique at the
//! schema level (hard UNIQUE constraint, unlike the soft natural keys of
//! customers and products): login identity must never be ambiguous, even
//! against soft-deleted accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// A user row. `password_hash` is an argon2 PHC string - it is never
/// serialized into API responses (handlers map to a hash-free DTO).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a user. The password arrives already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Partial update: only `Some` fields are written. A provided password has
/// already been re-hashed by the caller.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl UserPatch {
    /// True when no field was provided at all.
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.password_hash.is_none()
    }
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new user and returns the created row.
    ///
    /// A colliding email surfaces as [`DbError::UniqueViolation`] via the
    /// schema constraint.
    pub async fn insert(&self, new: &NewUser) -> DbResult<User> {
        debug!(email = %new.email, "Inserting user");

        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, 1, ?4, ?4)
            RETURNING *
            "#,
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Finds an active user by (lowercased) email, for login.
    pub async fn find_active_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE email = ?1 AND is_active = 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Lists active users, newest first.
    pub async fn list_active(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE is_active = 1
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Gets an active user by id.
    pub async fn get_active(&self, id: i64) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Applies a partial update to an active user.
    pub async fn update(&self, id: i64, patch: &UserPatch) -> DbResult<()> {
        debug!(id = %id, "Updating user");

        let now = Utc::now();
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET ");

        let mut fields = qb.separated(", ");
        if let Some(username) = &patch.username {
            fields.push("username = ").push_bind_unseparated(username);
        }
        if let Some(email) = &patch.email {
            fields.push("email = ").push_bind_unseparated(email);
        }
        if let Some(password_hash) = &patch.password_hash {
            fields
                .push("password_hash = ")
                .push_bind_unseparated(password_hash);
        }
        fields.push("updated_at = ").push_bind_unseparated(now);

        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND is_active = 1");

        let result = qb.build().execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Soft-deletes a user by setting is_active = 0.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting user");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_active = 0, updated_at = ?2
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn sample(email: &str) -> NewUser {
        NewUser {
            username: "admin".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$fake-hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_login_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        repo.insert(&sample("admin@faktur.app")).await.unwrap();

        let user = repo
            .find_active_by_email("admin@faktur.app")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.username, "admin");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        repo.insert(&sample("dup@faktur.app")).await.unwrap();
        let err = repo.insert(&sample("dup@faktur.app")).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_soft_deleted_user_cannot_login() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        let user = repo.insert(&sample("gone@faktur.app")).await.unwrap();
        repo.soft_delete(user.id).await.unwrap();

        assert!(repo
            .find_active_by_email("gone@faktur.app")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_password_rotation_patch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        let user = repo.insert(&sample("rotate@faktur.app")).await.unwrap();
        let patch = UserPatch {
            password_hash: Some("$argon2id$new-hash".to_string()),
            ..Default::default()
        };
        repo.update(user.id, &patch).await.unwrap();

        let fetched = repo.get_active(user.id).await.unwrap().unwrap();
        assert_eq!(fetched.password_hash, "$argon2id$new-hash");
        assert_eq!(fetched.email, "rotate@faktur.app");
    }
}

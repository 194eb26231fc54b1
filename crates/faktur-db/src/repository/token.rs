//! # Refresh Token Repository
//!
//! Storage for rotating refresh tokens. Only the SHA-256 digest of a token
//! is ever persisted; the raw value exists client-side only. Rotation
//! replaces the old row and inserts the new one in a single transaction so
//! a crash can never leave both (or neither) valid.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// A stored refresh token digest.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshToken {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Whether the token has passed its expiry instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Repository for refresh token storage.
#[derive(Debug, Clone)]
pub struct RefreshTokenRepository {
    pool: SqlitePool,
}

impl RefreshTokenRepository {
    /// Creates a new RefreshTokenRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RefreshTokenRepository { pool }
    }

    /// Stores a new token digest for a user.
    pub async fn insert(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(user_id = %user_id, "Storing refresh token");

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Looks up a token by its digest.
    pub async fn find_by_hash(&self, token_hash: &str) -> DbResult<Option<RefreshToken>> {
        let token = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT * FROM refresh_tokens
            WHERE token_hash = ?1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    /// Rotates a token: deletes the presented digest and stores the
    /// replacement atomically.
    ///
    /// Fails with NotFound when the old digest is already gone - a replayed
    /// rotation attempt, which must not mint a fresh token.
    pub async fn rotate(
        &self,
        old_hash: &str,
        user_id: i64,
        new_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(user_id = %user_id, "Rotating refresh token");

        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = ?1")
            .bind(old_hash)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(DbError::not_found("Refresh token", "presented"));
        }

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(user_id)
        .bind(new_hash)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Deletes a token by digest (explicit invalidation of an expired one).
    pub async fn delete_by_hash(&self, token_hash: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = ?1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

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
    use crate::repository::user::NewUser;
    use chrono::Duration;

    async fn user_id(db: &Database) -> i64 {
        db.users()
            .insert(&NewUser {
                username: "admin".to_string(),
                email: "admin@faktur.app".to_string(),
                password_hash: "$argon2id$fake".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_store_and_find() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.refresh_tokens();
        let uid = user_id(&db).await;

        let expires = Utc::now() + Duration::days(7);
        repo.insert(uid, "digest-a", expires).await.unwrap();

        let found = repo.find_by_hash("digest-a").await.unwrap().unwrap();
        assert_eq!(found.user_id, uid);
        assert!(!found.is_expired(Utc::now()));
    }

    #[tokio::test]
    async fn test_rotation_invalidates_old_token() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.refresh_tokens();
        let uid = user_id(&db).await;

        let expires = Utc::now() + Duration::days(7);
        repo.insert(uid, "digest-old", expires).await.unwrap();
        repo.rotate("digest-old", uid, "digest-new", expires)
            .await
            .unwrap();

        assert!(repo.find_by_hash("digest-old").await.unwrap().is_none());
        assert!(repo.find_by_hash("digest-new").await.unwrap().is_some());

        // Replaying the consumed token must not mint another one.
        let err = repo
            .rotate("digest-old", uid, "digest-newer", expires)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_expiry_check() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.refresh_tokens();
        let uid = user_id(&db).await;

        repo.insert(uid, "digest-exp", Utc::now() - Duration::minutes(1))
            .await
            .unwrap();

        let found = repo.find_by_hash("digest-exp").await.unwrap().unwrap();
        assert!(found.is_expired(Utc::now()));
    }
}

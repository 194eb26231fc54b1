//! Authentication primitives.
//!
//! Three independent mechanisms live here:
//! - Access tokens: short-lived HS256 JWTs carrying the user identity.
//! - Refresh tokens: opaque random values; only their SHA-256 digest is
//!   persisted, and every use rotates them.
//! - Password hashing: argon2id PHC strings.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

// =============================================================================
// JWT Access Tokens
// =============================================================================

/// JWT claims structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id).
    pub sub: i64,

    /// Username, for display without a user lookup.
    pub username: String,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration (Unix timestamp).
    pub exp: i64,

    /// JWT ID (unique identifier for this token).
    pub jti: String,

    /// Token type (always "access"; refresh tokens are opaque, not JWTs).
    pub token_type: String,
}

/// Why a presented token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Signature valid but past its expiry.
    Expired,
    /// Anything else: bad signature, malformed, wrong type.
    Invalid,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    access_lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: String, access_lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            access_lifetime_secs,
        }
    }

    /// Generate an access token for a user.
    pub fn generate_access_token(&self, user_id: i64, username: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_lifetime_secs);

        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: "access".to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|_| AuthError::Invalid)
    }

    /// Validate and decode an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        // The default 60s leeway would keep accepting a token for a minute
        // past exp; expiry is exact here.
        validation.leeway = 0;

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::Invalid,
        })?;

        if token_data.claims.token_type != "access" {
            return Err(AuthError::Invalid);
        }

        Ok(token_data.claims)
    }
}

/// Extract a bearer token from an Authorization header value.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

// =============================================================================
// Refresh Tokens
// =============================================================================

/// Generates an opaque refresh token: 64 random bytes, hex-encoded.
pub fn generate_refresh_token() -> String {
    use rand::RngCore;

    let mut bytes = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex_encode(&bytes)
}

/// SHA-256 digest of a refresh token, hex-encoded. This is the only form
/// that ever reaches storage.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex_encode(hasher.finalize().as_slice())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// =============================================================================
// Password Hashing
// =============================================================================

/// Hashes a password with argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    Argon2::default()
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::Invalid)
}

/// Verifies a password against a stored PHC hash string.
///
/// A malformed stored hash verifies as false rather than erroring: the
/// caller only ever needs "may this login proceed".
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);

        let token = manager.generate_access_token(7, "admin").unwrap();
        let claims = manager.validate_access_token(&token).unwrap();

        assert_eq!(claims.sub, 7);
        assert_eq!(claims.username, "admin");
        assert_eq!(claims.token_type, "access");
    }

    #[test]
    fn test_expired_token_rejected_as_expired() {
        let manager = JwtManager::new("test-secret".to_string(), -10);

        let token = manager.generate_access_token(7, "admin").unwrap();
        assert_eq!(
            manager.validate_access_token(&token),
            Err(AuthError::Expired)
        );
    }

    #[test]
    fn test_wrong_secret_rejected_as_invalid() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);
        let other = JwtManager::new("other-secret".to_string(), 3600);

        let token = manager.generate_access_token(7, "admin").unwrap();
        assert_eq!(other.validate_access_token(&token), Err(AuthError::Invalid));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token(""), None);
    }

    #[test]
    fn test_refresh_token_shape_and_digest() {
        let token = generate_refresh_token();
        assert_eq!(token.len(), 128); // 64 bytes hex-encoded
        assert!(token.bytes().all(|b| b.is_ascii_hexdigit()));

        let digest = hash_refresh_token(&token);
        assert_eq!(digest.len(), 64); // SHA-256 hex
        assert_eq!(digest, hash_refresh_token(&token));
        assert_ne!(digest, hash_refresh_token("other"));
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));

        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret", "not-a-phc-string"));
    }
}

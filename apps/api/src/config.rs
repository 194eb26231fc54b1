//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! development defaults. A `.env` file is honored in development via
//! `dotenvy` (loaded by `main` before this runs).

use std::env;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP listen port.
    pub http_port: u16,

    /// Path to the SQLite database file.
    pub database_path: String,

    /// JWT secret key for signing access tokens.
    pub jwt_secret: String,

    /// Access token lifetime in seconds.
    pub jwt_access_lifetime_secs: i64,

    /// Refresh token lifetime in seconds.
    pub refresh_lifetime_secs: i64,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HTTP_PORT".to_string()))?,

            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "./faktur.db".to_string()),

            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                // Development fallback. In production this MUST be set via
                // environment variable.
                "faktur-dev-secret-change-in-production".to_string()
            }),

            jwt_access_lifetime_secs: env::var("JWT_ACCESS_LIFETIME_SECS")
                .unwrap_or_else(|_| "86400".to_string()) // 1 day
                .parse()
                .map_err(|_| ConfigError::InvalidValue("JWT_ACCESS_LIFETIME_SECS".to_string()))?,

            refresh_lifetime_secs: env::var("REFRESH_LIFETIME_SECS")
                .unwrap_or_else(|_| "604800".to_string()) // 7 days
                .parse()
                .map_err(|_| ConfigError::InvalidValue("REFRESH_LIFETIME_SECS".to_string()))?,
        };

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load_without_env() {
        // Only asserts the defaults we rely on elsewhere; environment
        // variables set by the harness would override the rest.
        let config = ApiConfig::load().unwrap();
        assert!(config.jwt_access_lifetime_secs > 0);
        assert!(config.refresh_lifetime_secs > 0);
    }
}

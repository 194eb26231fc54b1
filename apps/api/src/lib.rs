//! # Faktur API
//!
//! REST/JSON server for the Faktur invoicing back office.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Faktur API Server                                │
//! │                                                                         │
//! │  React UI ───► HTTP/JSON ───► Router ───► Handlers ───► faktur-db     │
//! │                                  │                                      │
//! │                                  ▼                                      │
//! │                          Bearer JWT middleware                          │
//! │                          (every route except /login                     │
//! │                           and /token/refresh)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use faktur_db::Database;

use crate::auth::JwtManager;
use crate::config::ApiConfig;

/// Shared application state, cloned into every handler.
///
/// Constructed once at startup; the database handle is the only resource
/// with a real lifecycle (closed on shutdown).
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    /// Builds the application state from loaded configuration and a
    /// connected database.
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(
            config.jwt_secret.clone(),
            config.jwt_access_lifetime_secs,
        );
        AppState {
            db,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
        }
    }
}

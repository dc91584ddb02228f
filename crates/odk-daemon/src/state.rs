//! Shared runtime state for odk-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The pool is the only
//! mutable resource and manages its own concurrency; nothing here needs a
//! lock.

use odk_config::AppConfig;
use serde::Serialize;
use sqlx::PgPool;

/// Static build metadata included in health responses.
#[derive(Clone, Debug, Serialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

/// Cloneable (via `Arc`) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Postgres pool.
    pub db: PgPool,
    /// Static build metadata.
    pub build: BuildInfo,
    /// Effective daemon configuration (session TTL, bind address).
    pub config: AppConfig,
}

impl AppState {
    pub fn new(db: PgPool, config: AppConfig) -> Self {
        Self {
            db,
            build: BuildInfo {
                service: "odk-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            config,
        }
    }
}

//! PostgreSQL persistence for OrderDesk.
//!
//! Connection/migration plumbing lives here; the stores are split by
//! subsystem: [`accounts`] (users, sessions, profiles), [`menu`] (catalog),
//! [`orders`] (the order aggregate and its status transitions).
//!
//! Store operations return [`StoreError`] so the HTTP layer can map each
//! class to a status code. Operational plumbing (connect, migrate) uses
//! `anyhow` with context, matching how the binaries consume it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgPoolOptions, PgPool};

pub mod accounts;
pub mod menu;
pub mod orders;

pub use odk_orders::OrderError;

pub const ENV_DB_URL: &str = "ODK_DATABASE_URL";

/// Connect to Postgres using ODK_DATABASE_URL.
pub async fn connect_from_env(max_connections: u32) -> Result<PgPool> {
    let url =
        std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(&url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

/// Simple status query (connectivity + schema presence).
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;
    let ok = one == 1;

    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema='public' and table_name='orders'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus { ok, has_orders_table: exists })
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_orders_table: bool,
}

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Error taxonomy surfaced by every store operation.
///
/// - `Validation` / `Invalid` / `UnknownRole` — caller-supplied data violates
///   a constraint; recoverable by correcting the input (HTTP 400).
/// - `BadCredentials` — login or session resolution failed (HTTP 401).
/// - `NotFound` — a referenced entity does not exist (HTTP 404).
/// - `Conflict` — a uniqueness constraint lost the race (HTTP 409); the
///   caller should retry from a fresh read.
/// - `Db` — the storage engine itself failed (HTTP 500).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] OrderError),

    #[error("{0}")]
    Invalid(String),

    #[error("unknown role '{0}'")]
    UnknownRole(String),

    #[error("invalid email or password")]
    BadCredentials,

    #[error("{what} not found")]
    NotFound { what: &'static str },

    #[error("{0}")]
    Conflict(&'static str),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// UserRole
// ---------------------------------------------------------------------------

/// Explicit account role, fixed at registration.
///
/// Resolved once per request from the session row — never inferred from
/// which profile tables happen to have a row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Restaurant,
    Customer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Restaurant => "restaurant",
            UserRole::Customer => "customer",
        }
    }

    pub fn parse(s: &str) -> StoreResult<Self> {
        match s {
            "restaurant" => Ok(UserRole::Restaurant),
            "customer" => Ok(UserRole::Customer),
            other => Err(StoreError::UnknownRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Detect a Postgres constraint violation (unique, FK, check) by name.
pub(crate) fn is_constraint_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint() == Some(constraint),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_roundtrip() {
        assert_eq!(UserRole::parse("restaurant").unwrap(), UserRole::Restaurant);
        assert_eq!(UserRole::parse("customer").unwrap(), UserRole::Customer);
        assert!(matches!(
            UserRole::parse("admin"),
            Err(StoreError::UnknownRole(_))
        ));
        for r in [UserRole::Restaurant, UserRole::Customer] {
            assert_eq!(UserRole::parse(r.as_str()).unwrap(), r);
        }
    }
}

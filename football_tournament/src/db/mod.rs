//! PostgreSQL backend: connection pool, schema and repositories.
//!
//! The remote tournament store and the player collection both live here.
//! Tournament writes notify the `tournament_changes` channel so subscribers
//! get pushed updates instead of polling.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::sync::SyncError;

pub mod config;
pub mod repository;

pub use config::DatabaseConfig;
pub use repository::{CHANGE_CHANNEL, PgPlayerRepository, PgTournamentStore};

/// Schema applied by [`Database::ensure_schema`]
pub const SCHEMA: &str = include_str!("../../migrations/001_initial_schema.sql");

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use football_tournament::db::{Database, DatabaseConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), sqlx::Error> {
    ///     let db = Database::new(&DatabaseConfig::from_env()).await?;
    ///     db.ensure_schema().await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables and indexes that do not exist yet
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Check if the database connection is healthy
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the database connection pool
    pub async fn close(self) {
        self.pool.close().await;
    }
}

/// PostgreSQL `insufficient_privilege`
const INSUFFICIENT_PRIVILEGE: &str = "42501";

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db)
                if db.code().as_deref() == Some(INSUFFICIENT_PRIVILEGE) =>
            {
                SyncError::PermissionDenied
            }
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => SyncError::NetworkUnavailable(err.to_string()),
            sqlx::Error::Decode(_) | sqlx::Error::ColumnDecode { .. } => {
                SyncError::ParseFailure(err.to_string())
            }
            sqlx::Error::RowNotFound => SyncError::NotFound(err.to_string()),
            other => SyncError::Backend(other.to_string()),
        }
    }
}

//! Database layer - pool setup, migrations and the company store

pub mod search;
pub mod store;
pub mod traits;

pub use search::executor::{PagedExecutor, RawSqlPage};
pub use store::PostgresCompanyStore;
pub use traits::CompanyStore;

use crate::config::DatabaseConfig;
use crate::{Error, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;

/// Open a connection pool. Every connection carries the configured
/// `statement_timeout`, which also bounds generated SQL.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool> {
    let statement_timeout = format!("{}s", config.statement_timeout_seconds);
    let options = PgConnectOptions::from_str(&config.url)
        .map_err(Error::Database)?
        .options([("statement_timeout", statement_timeout.as_str())]);

    let pool = PgPoolOptions::new()
        .min_connections(config.pool_min_size)
        .max_connections(config.pool_max_size)
        .acquire_timeout(Duration::from_secs(config.pool_timeout_seconds))
        .connect_with(options)
        .await
        .map_err(Error::Database)?;

    tracing::info!(
        min_connections = config.pool_min_size,
        max_connections = config.pool_max_size,
        "Database pool ready"
    );

    Ok(pool)
}

/// Apply the bundled migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| Error::Internal(format!("Failed to run migrations: {}", e)))?;
    tracing::info!("Database migrations applied");
    Ok(())
}

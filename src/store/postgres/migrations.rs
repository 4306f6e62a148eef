//! Embedded core schema and a helper to apply it.

use super::PgPool;
use diesel::connection::SimpleConnection;
use diesel::r2d2::PoolError;
use thiserror::Error;
use tracing::info;

/// SQL creating the core tables and seeding the role catalog.
///
/// Every statement is idempotent, so applying it to an initialized database
/// is a no-op.
pub const CORE_SCHEMA_SQL: &str =
    include_str!("../../../migrations/2026-03-02-000000_create_core_tables/up.sql");

/// Errors raised while applying the core schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// No connection could be checked out of the pool.
    #[error("failed to obtain a database connection: {0}")]
    Pool(#[from] PoolError),
    /// The schema statements failed.
    #[error("failed to apply core schema: {0}")]
    Query(#[from] diesel::result::Error),
    /// The blocking worker panicked or was cancelled.
    #[error("schema worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Applies [`CORE_SCHEMA_SQL`] through a pooled connection.
///
/// # Errors
///
/// Returns [`SchemaError`] when no connection is available or a statement
/// fails.
pub async fn apply_core_schema(pool: &PgPool) -> Result<(), SchemaError> {
    let worker_pool = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<(), SchemaError> {
        let mut connection = worker_pool.get()?;
        connection.batch_execute(CORE_SCHEMA_SQL)?;
        Ok(())
    })
    .await??;
    info!("core schema applied");
    Ok(())
}

//! Applies the core `PostgreSQL` schema and seeds the role catalog.
//!
//! Usage:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/pmt pmt_schema
//! ```
//!
//! Connection settings are read by [`StoreConfig::from_env`], which also
//! loads a `.env` file when present. Log verbosity follows `RUST_LOG`.

use pmt::config::StoreConfig;
use pmt::store::postgres::{apply_core_schema, connect};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pmt=info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = StoreConfig::from_env()?;
    info!(
        max_connections = config.max_connections,
        "connecting to database"
    );
    let pool = connect(&config)?;
    apply_core_schema(&pool).await?;
    Ok(())
}

// storefront/src/db/mod.rs

pub mod pg_store;

pub use pg_store::PgStore;

use crate::errors::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, instrument};

#[instrument(name = "db::connect", skip_all, err(Display))]
pub async fn connect(database_url: &str) -> Result<PgPool> {
  let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
  info!("Successfully connected to the database.");
  Ok(pool)
}

/// Applies `storefront/migrations/` in order.
#[instrument(name = "db::run_migrations", skip_all, err(Display))]
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
  sqlx::migrate!("./migrations").run(pool).await?;
  info!("Database migrations applied.");
  Ok(())
}

use anyhow::{Context, Result, anyhow};
use diesel::{Connection, PgConnection};
use diesel_async::pooled_connection::bb8::Pool;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness};

use crate::core::{
    aliases::{DbConnectionManager, DbPool},
    config::DatabaseConfig,
};

/// Build the connection pool and verify that one connection can be opened.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let manager = DbConnectionManager::new(&config.url);
    Pool::builder()
        .max_size(config.max_connections)
        .build(manager)
        .await
        .context("Failed to build the DB connection pool")
}

/// Build a pool that opens connections only on first checkout.
pub fn create_lazy_pool(url: &str) -> DbPool {
    Pool::builder().build_unchecked(DbConnectionManager::new(url))
}

/// Run pending migrations on a blocking thread with a sync connection.
pub async fn run_migrations_blocking(migrations: EmbeddedMigrations, url: &str) -> Result<usize> {
    let url = url.to_string();
    tokio::task::spawn_blocking(move || {
        let mut conn =
            PgConnection::establish(&url).context("Failed to connect for migrations")?;
        let applied = conn
            .run_pending_migrations(migrations)
            .map_err(|err| anyhow!("Failed to run migrations: {err}"))?;
        Ok(applied.len())
    })
    .await
    .context("Migration task panicked")?
}

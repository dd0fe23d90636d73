use anyhow::{Context, Result};
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use shoecare_orderservice::{
    app,
    core::{app_state::AppState, bootstrap, config, db},
};

/// Migrations embedded into the binary so the image needs no migration files.
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_env();
    bootstrap::init_tracing();

    let config = config::load().context("Invalid configuration")?;
    tracing::info!(environment = %config.environment, tax_rate = %config.tax_rate, "configuration loaded");

    tracing::info!("Running migrations...");
    let migrations_count = db::run_migrations_blocking(MIGRATIONS, &config.database.url).await?;
    tracing::info!("Run {} new migrations successfully", migrations_count);

    let db_pool = db::create_pool(&config.database).await?;
    let server = config.server.clone();
    let state = AppState::new(db_pool, config);
    if !state.notifier.is_enabled() {
        tracing::info!("NOTIFY_WEBHOOK_URL not set, order events are not forwarded");
    }

    tracing::info!("Bootstrapping...");
    bootstrap::serve("OrderService", app(state), &server).await
}

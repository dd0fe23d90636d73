use std::sync::Arc;

use anyhow::Context;
use reqwest::Client;

use crate::{
    api::notifications::Notifier,
    core::{
        aliases::{DbConn, DbPool},
        app_error::AppError,
        config::Config,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub config: Arc<Config>,
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(db_pool: DbPool, config: Config) -> Self {
        let notifier = Notifier::new(Client::new(), config.notify_webhook_url.clone());
        Self {
            db_pool,
            config: Arc::new(config),
            notifier,
        }
    }

    /// Check out a pooled connection.
    pub async fn conn(&self) -> Result<DbConn<'_>, AppError> {
        Ok(self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?)
    }
}

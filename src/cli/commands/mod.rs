pub mod database;
pub mod server;
pub mod user;

use std::sync::Arc;

use anyhow::Context;

use crate::config::AppConfig;
use crate::database::{DatabaseManager, Store};

/// Opens the store named by the environment without applying the schema.
pub(crate) async fn open_store() -> anyhow::Result<(AppConfig, Arc<dyn Store>)> {
    let mut config = AppConfig::from_env()?;
    config.database.auto_migrate = false;

    let store = DatabaseManager::open_store(&config.database)
        .await
        .context("failed to open database")?;
    Ok((config, store))
}

use serde_json::json;

use crate::cli::utils::{output_field, output_success};
use crate::cli::OutputFormat;

pub async fn migrate(output_format: OutputFormat) -> anyhow::Result<()> {
    let (config, store) = super::open_store().await?;

    if config.database.is_memory() {
        tracing::warn!("DATABASE_URL points at the in-process store; nothing is persisted");
    }

    store.migrate().await?;
    store.close().await;

    output_success(
        output_format,
        "Schema is up to date",
        Some(json!({ "database": config.database.name })),
    )?;
    output_field(output_format, "Database", &config.database.name);
    Ok(())
}

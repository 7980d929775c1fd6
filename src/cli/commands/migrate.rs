use anyhow::Context;
use serde_json::json;

use crate::cli::output::output_success;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let database = &config().database;
    let url = database
        .url
        .as_deref()
        .context("DATABASE_URL is not set")?;

    let pool = DatabaseManager::connect(database).await?;
    DatabaseManager::migrate(&pool).await?;

    output_success(
        output_format,
        "Migrations applied",
        Some(json!({ "database": DatabaseManager::redacted_url(url) })),
    )
}

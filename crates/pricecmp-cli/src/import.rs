//! Price file import for the CLI.

use std::path::Path;

use anyhow::Context;
use pricecmp_core::CityAliases;
use pricecmp_db::PriceRecord;

/// Parses a JSON array of [`PriceRecord`]s.
///
/// # Errors
///
/// Returns an error when the text is not a JSON array of records.
pub(crate) fn parse_price_file(content: &str) -> anyhow::Result<Vec<PriceRecord>> {
    serde_json::from_str(content).context("price file must be a JSON array of price records")
}

/// Reads `path` and writes every record in one transaction.
///
/// An empty file is reported and skipped without opening a transaction.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, a record fails
/// validation, or the import transaction fails.
pub(crate) async fn run_import(
    pool: &sqlx::PgPool,
    aliases: &CityAliases,
    path: &Path,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records = parse_price_file(&content)?;

    if records.is_empty() {
        tracing::warn!(path = %path.display(), "price file has no records");
        println!("{}: no price records", path.display());
        return Ok(());
    }

    let summary = pricecmp_db::import_price_records(pool, &records, aliases).await?;
    tracing::info!(
        path = %path.display(),
        records = summary.records,
        prices_changed = summary.prices_changed,
        "price file imported"
    );
    println!(
        "imported {} records from {} ({} prices changed)",
        summary.records,
        path.display(),
        summary.prices_changed
    );
    Ok(())
}

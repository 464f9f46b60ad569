//! Bulk import of already-normalized shelf prices.
//!
//! Feed parsing happens upstream; this module only persists flat records.
//! A `price_history` row is appended whenever a branch price is new or
//! differs from the stored one.

use pricecmp_core::{is_barcode, normalize_city, CityAliases};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};

use crate::DbError;

/// One shelf price as produced by a chain feed normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PriceRecord {
    pub chain: String,
    pub store_id: String,
    #[serde(default)]
    pub store_name: Option<String>,
    pub city: String,
    pub barcode: String,
    pub name: String,
    /// Accepts a JSON number or a decimal string.
    pub price: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub records: usize,
    /// Branch prices whose value was new or changed.
    pub prices_changed: usize,
}

/// Validates every record before any write so a bad file changes nothing.
fn validate_records(records: &[PriceRecord]) -> Result<(), DbError> {
    for (index, record) in records.iter().enumerate() {
        let reason = if record.chain.trim().is_empty() {
            Some("chain is empty")
        } else if record.store_id.trim().is_empty() {
            Some("store_id is empty")
        } else if record.city.trim().is_empty() {
            Some("city is empty")
        } else if !is_barcode(&record.barcode) {
            Some("barcode must contain only digits")
        } else if record.name.trim().is_empty() {
            Some("name is empty")
        } else if record.price.is_sign_negative() {
            Some("price is negative")
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(DbError::InvalidRecord {
                index,
                reason: reason.to_string(),
            });
        }
    }
    Ok(())
}

/// Upserts chains, branches, chain products, and branch prices for every
/// record in a single transaction.
///
/// Cities are stored in canonical form via `aliases`. Chains not yet in the
/// catalog are created with no display name.
///
/// # Errors
///
/// Returns [`DbError::InvalidRecord`] before touching the database when any
/// record is malformed, and [`DbError::Sqlx`] if a write fails (the whole
/// import is rolled back).
pub async fn import_price_records(
    pool: &PgPool,
    records: &[PriceRecord],
    aliases: &CityAliases,
) -> Result<ImportSummary, DbError> {
    validate_records(records)?;

    let mut tx = pool.begin().await?;
    let mut summary = ImportSummary::default();

    for record in records {
        let chain_name = record.chain.trim().to_lowercase();
        let city = normalize_city(&record.city, aliases);

        let chain_id = upsert_chain(&mut tx, &chain_name).await?;
        let branch_id = upsert_branch(&mut tx, chain_id, record, &city).await?;
        let chain_product_id = upsert_chain_product(&mut tx, chain_id, record).await?;

        if upsert_branch_price(&mut tx, chain_product_id, branch_id, record.price).await? {
            summary.prices_changed += 1;
        }
        summary.records += 1;
    }

    tx.commit().await?;

    tracing::info!(
        records = summary.records,
        prices_changed = summary.prices_changed,
        "price import committed"
    );
    Ok(summary)
}

async fn upsert_chain(tx: &mut Transaction<'_, Postgres>, name: &str) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO chains (name) VALUES ($1) \
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
         RETURNING id",
    )
    .bind(name)
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}

async fn upsert_branch(
    tx: &mut Transaction<'_, Postgres>,
    chain_id: i64,
    record: &PriceRecord,
    city: &str,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO branches (chain_id, store_id, name, city) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (chain_id, store_id) DO UPDATE SET \
             name       = COALESCE(EXCLUDED.name, branches.name), \
             city       = EXCLUDED.city, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(chain_id)
    .bind(record.store_id.trim())
    .bind(&record.store_name)
    .bind(city)
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}

async fn upsert_chain_product(
    tx: &mut Transaction<'_, Postgres>,
    chain_id: i64,
    record: &PriceRecord,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO chain_products (chain_id, barcode, name) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (chain_id, barcode) DO UPDATE SET \
             name       = EXCLUDED.name, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(chain_id)
    .bind(record.barcode.trim())
    .bind(record.name.trim())
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}

/// Rounds to the two decimals `NUMERIC(10, 2)` stores, halves away from zero
/// as the Postgres cast does.
pub(crate) fn to_stored_price(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns `true` when the stored price was absent or different.
async fn upsert_branch_price(
    tx: &mut Transaction<'_, Postgres>,
    chain_product_id: i64,
    branch_id: i64,
    price: Decimal,
) -> Result<bool, DbError> {
    let price = to_stored_price(price);
    let previous = sqlx::query_scalar::<_, Decimal>(
        "SELECT price FROM branch_prices \
         WHERE chain_product_id = $1 AND branch_id = $2 \
         FOR UPDATE",
    )
    .bind(chain_product_id)
    .bind(branch_id)
    .fetch_optional(&mut **tx)
    .await?;

    sqlx::query(
        "INSERT INTO branch_prices (chain_product_id, branch_id, price, last_updated) \
         VALUES ($1, $2, $3, NOW()) \
         ON CONFLICT (chain_product_id, branch_id) DO UPDATE SET \
             price        = EXCLUDED.price, \
             last_updated = NOW()",
    )
    .bind(chain_product_id)
    .bind(branch_id)
    .bind(price)
    .execute(&mut **tx)
    .await?;

    if previous == Some(price) {
        return Ok(false);
    }

    sqlx::query(
        "INSERT INTO price_history (chain_product_id, branch_id, price) \
         VALUES ($1, $2, $3)",
    )
    .bind(chain_product_id)
    .bind(branch_id)
    .bind(price)
    .execute(&mut **tx)
    .await?;

    Ok(true)
}

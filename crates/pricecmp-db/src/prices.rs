//! Postgres adapter for the [`PriceRepository`] port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pricecmp_core::{PriceRepository, PriceRow, RepositoryError, SearchQuery};
use rust_decimal::Decimal;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// One `branch_prices` row joined with its branch, chain, and chain product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriceLookupRow {
    pub chain: String,
    pub chain_display_name: Option<String>,
    pub store: String,
    pub store_name: Option<String>,
    pub item_code: String,
    pub item_name: String,
    pub price: Decimal,
    pub last_updated: DateTime<Utc>,
}

impl From<PriceLookupRow> for PriceRow {
    fn from(row: PriceLookupRow) -> Self {
        Self {
            chain: row.chain,
            chain_display_name: row.chain_display_name,
            store: row.store,
            store_name: row.store_name,
            item_code: Some(row.item_code),
            item_name: Some(row.item_name),
            price: row.price,
            last_updated: row.last_updated,
        }
    }
}

const PRICE_LOOKUP_SELECT: &str = "\
    SELECT c.name AS chain, c.display_name AS chain_display_name, \
           b.store_id AS store, b.name AS store_name, \
           cp.barcode AS item_code, cp.name AS item_name, \
           bp.price, bp.last_updated \
    FROM branch_prices bp \
    JOIN branches b ON b.id = bp.branch_id \
    JOIN chain_products cp ON cp.id = bp.chain_product_id \
    JOIN chains c ON c.id = cp.chain_id \
    WHERE lower(b.city) = lower($1)";

const PRICE_LOOKUP_ORDER: &str = " ORDER BY cp.name, c.name, b.store_id";

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// [`PriceRepository`] backed by the `branch_prices` schema.
#[derive(Debug, Clone)]
pub struct PgPriceRepository {
    pool: PgPool,
}

impl PgPriceRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PriceRepository for PgPriceRepository {
    async fn fetch_prices(
        &self,
        city: &str,
        filter: &SearchQuery,
    ) -> Result<Vec<PriceRow>, RepositoryError> {
        let patterns: Vec<String> = filter.tokens().iter().map(|t| contains_pattern(t)).collect();
        if patterns.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!("{PRICE_LOOKUP_SELECT} AND cp.name ILIKE ALL($2){PRICE_LOOKUP_ORDER}");
        let rows = sqlx::query_as::<_, PriceLookupRow>(&sql)
            .bind(city)
            .bind(patterns.as_slice())
            .fetch_all(&self.pool)
            .await
            .map_err(to_repository_error)?;

        Ok(rows.into_iter().map(PriceRow::from).collect())
    }

    async fn fetch_prices_for_barcodes(
        &self,
        city: &str,
        barcodes: &[String],
    ) -> Result<Vec<PriceRow>, RepositoryError> {
        if barcodes.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!("{PRICE_LOOKUP_SELECT} AND cp.barcode = ANY($2){PRICE_LOOKUP_ORDER}");
        let rows = sqlx::query_as::<_, PriceLookupRow>(&sql)
            .bind(city)
            .bind(barcodes)
            .fetch_all(&self.pool)
            .await
            .map_err(to_repository_error)?;

        Ok(rows.into_iter().map(PriceRow::from).collect())
    }
}

/// `ILIKE` pattern matching `token` anywhere, with `\`, `%`, and `_` escaped.
#[must_use]
pub fn contains_pattern(token: &str) -> String {
    let mut pattern = String::with_capacity(token.len() + 2);
    pattern.push('%');
    for c in token.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn to_repository_error(error: sqlx::Error) -> RepositoryError {
    match error {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::Connection {
                message: error.to_string(),
            }
        }
        other => RepositoryError::Query {
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_pattern_wraps_plain_tokens() {
        assert_eq!(contains_pattern("חלב"), "%חלב%");
    }

    #[test]
    fn contains_pattern_escapes_like_metacharacters() {
        assert_eq!(contains_pattern("3%"), "%3\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern("x\\y"), "%x\\\\y%");
    }

    #[test]
    fn pool_errors_map_to_connection_failures() {
        let mapped = to_repository_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(mapped, RepositoryError::Connection { .. }));

        let mapped = to_repository_error(sqlx::Error::RowNotFound);
        assert!(matches!(mapped, RepositoryError::Query { .. }));
    }
}

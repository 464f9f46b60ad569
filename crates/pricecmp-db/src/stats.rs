//! Aggregate figures over the stored catalog and recent price activity.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// Recent-update samples returned alongside the total count.
pub const RECENT_UPDATE_SAMPLES: i64 = 10;

const TOP_CITIES: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PriceTotals {
    pub total: i64,
    pub average: Option<Decimal>,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ChainProductCount {
    pub chain: String,
    pub products: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CityBranchCount {
    pub city: String,
    pub branches: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogStatistics {
    pub prices: PriceTotals,
    pub products_by_chain: Vec<ChainProductCount>,
    /// The ten cities with the most branches, largest first.
    pub top_cities: Vec<CityBranchCount>,
    pub saved_carts: i64,
    pub cart_owners: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RecentPriceRow {
    pub product: String,
    pub barcode: String,
    pub price: Decimal,
    pub chain: String,
    pub store_id: String,
    pub city: String,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentUpdates {
    pub since: DateTime<Utc>,
    pub total: i64,
    /// Most recent first, at most [`RECENT_UPDATE_SAMPLES`].
    pub samples: Vec<RecentPriceRow>,
}

/// Collects the catalog-wide statistics in a single read.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn catalog_statistics(pool: &PgPool) -> Result<CatalogStatistics, DbError> {
    let prices = sqlx::query_as::<_, PriceTotals>(
        "SELECT COUNT(*) AS total, \
                ROUND(AVG(price), 2) AS average, \
                MIN(price) AS min, \
                MAX(price) AS max \
         FROM branch_prices",
    )
    .fetch_one(pool)
    .await?;

    let products_by_chain = sqlx::query_as::<_, ChainProductCount>(
        "SELECT c.name AS chain, COUNT(cp.id) AS products \
         FROM chains c \
         LEFT JOIN chain_products cp ON cp.chain_id = c.id \
         GROUP BY c.name \
         ORDER BY c.name",
    )
    .fetch_all(pool)
    .await?;

    let top_cities = sqlx::query_as::<_, CityBranchCount>(
        "SELECT city, COUNT(*) AS branches \
         FROM branches \
         WHERE btrim(city) <> '' \
         GROUP BY city \
         ORDER BY branches DESC, city \
         LIMIT $1",
    )
    .bind(TOP_CITIES)
    .fetch_all(pool)
    .await?;

    let (saved_carts, cart_owners) = sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(*), COUNT(DISTINCT owner) FROM saved_carts",
    )
    .fetch_one(pool)
    .await?;

    Ok(CatalogStatistics {
        prices,
        products_by_chain,
        top_cities,
        saved_carts,
        cart_owners,
    })
}

/// Counts shelf prices updated at or after `since` and returns the most
/// recent of them.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn recent_price_updates(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> Result<RecentUpdates, DbError> {
    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM branch_prices WHERE last_updated >= $1",
    )
    .bind(since)
    .fetch_one(pool)
    .await?;

    let samples = sqlx::query_as::<_, RecentPriceRow>(
        "SELECT cp.name AS product, cp.barcode, bp.price, \
                c.name AS chain, b.store_id, b.city, bp.last_updated \
         FROM branch_prices bp \
         JOIN chain_products cp ON cp.id = bp.chain_product_id \
         JOIN branches b ON b.id = bp.branch_id \
         JOIN chains c ON c.id = cp.chain_id \
         WHERE bp.last_updated >= $1 \
         ORDER BY bp.last_updated DESC, bp.id DESC \
         LIMIT $2",
    )
    .bind(since)
    .bind(RECENT_UPDATE_SAMPLES)
    .fetch_all(pool)
    .await?;

    Ok(RecentUpdates {
        since,
        total,
        samples,
    })
}

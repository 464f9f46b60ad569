//! Read-only listings of what the price catalog covers: cities, chains,
//! branches, and product names for autocomplete.

use sqlx::PgPool;

use crate::prices::contains_pattern;
use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ChainRow {
    pub id: i64,
    pub name: String,
    pub display_name: Option<String>,
}

/// A branch joined with the chain that operates it.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct BranchRow {
    pub id: i64,
    pub store_id: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: String,
    pub chain_id: i64,
    pub chain: String,
    pub chain_display_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Every city with at least one branch, sorted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_cities(pool: &PgPool) -> Result<Vec<String>, DbError> {
    let cities = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT city FROM branches WHERE btrim(city) <> '' ORDER BY city",
    )
    .fetch_all(pool)
    .await?;
    Ok(cities)
}

/// All chains ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_chains(pool: &PgPool) -> Result<Vec<ChainRow>, DbError> {
    let rows = sqlx::query_as::<_, ChainRow>(
        "SELECT id, name, display_name FROM chains ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Branches in `city` (case-insensitive exact match), optionally limited to
/// one chain. Ordered by chain name, then store id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_branches(
    pool: &PgPool,
    city: &str,
    chain_id: Option<i64>,
) -> Result<Vec<BranchRow>, DbError> {
    let rows = sqlx::query_as::<_, BranchRow>(
        "SELECT b.id, b.store_id, b.name, b.address, b.city, \
                c.id AS chain_id, c.name AS chain, c.display_name AS chain_display_name \
         FROM branches b \
         JOIN chains c ON c.id = b.chain_id \
         WHERE lower(b.city) = lower($1) \
           AND ($2::BIGINT IS NULL OR c.id = $2) \
         ORDER BY c.name, b.store_id",
    )
    .bind(city)
    .bind(chain_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Distinct product names containing `fragment` (case-insensitive), sorted,
/// at most `limit` of them.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn autocomplete_product_names(
    pool: &PgPool,
    fragment: &str,
    limit: i64,
) -> Result<Vec<String>, DbError> {
    let names = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT name FROM chain_products \
         WHERE name ILIKE $1 \
         ORDER BY name \
         LIMIT $2",
    )
    .bind(contains_pattern(fragment.trim()))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(names)
}

//! Database operations for `saved_carts`.
//!
//! Every query is scoped by `owner`; a cart owned by someone else behaves
//! exactly like a missing one.

use chrono::{DateTime, Utc};
use pricecmp_core::CartItem;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A full row from the `saved_carts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SavedCartRow {
    pub id: i64,
    pub owner: String,
    pub cart_name: String,
    pub city: String,
    pub items: Json<Vec<CartItem>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SavedCartRow {
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items.0
    }
}

/// List view of a saved cart without its items.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SavedCartSummary {
    pub id: i64,
    pub cart_name: String,
    pub city: String,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const SAVED_CART_COLUMNS: &str = "id, owner, cart_name, city, items, created_at, updated_at";

// ---------------------------------------------------------------------------
// saved_carts operations
// ---------------------------------------------------------------------------

/// Saves a cart, replacing the city and items of an existing cart with the
/// same `(owner, cart_name)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn save_cart(
    pool: &PgPool,
    owner: &str,
    cart_name: &str,
    city: &str,
    items: &[CartItem],
) -> Result<SavedCartRow, DbError> {
    let sql = format!(
        "INSERT INTO saved_carts (owner, cart_name, city, items) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (owner, cart_name) DO UPDATE SET \
             city       = EXCLUDED.city, \
             items      = EXCLUDED.items, \
             updated_at = NOW() \
         RETURNING {SAVED_CART_COLUMNS}"
    );
    let row = sqlx::query_as::<_, SavedCartRow>(&sql)
        .bind(owner)
        .bind(cart_name)
        .bind(city)
        .bind(Json(items))
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// Lists the owner's carts, most recently updated first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_saved_carts(pool: &PgPool, owner: &str) -> Result<Vec<SavedCartSummary>, DbError> {
    let rows = sqlx::query_as::<_, SavedCartSummary>(
        "SELECT id, cart_name, city, \
                jsonb_array_length(items)::BIGINT AS item_count, \
                created_at, updated_at \
         FROM saved_carts \
         WHERE owner = $1 \
         ORDER BY updated_at DESC, id DESC",
    )
    .bind(owner)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the cart, or `None` when it does not exist for this owner.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_saved_cart(
    pool: &PgPool,
    owner: &str,
    id: i64,
) -> Result<Option<SavedCartRow>, DbError> {
    let sql = format!("SELECT {SAVED_CART_COLUMNS} FROM saved_carts WHERE owner = $1 AND id = $2");
    let row = sqlx::query_as::<_, SavedCartRow>(&sql)
        .bind(owner)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Replaces the items of an existing cart.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_saved_cart_items(
    pool: &PgPool,
    owner: &str,
    id: i64,
    items: &[CartItem],
) -> Result<Option<SavedCartRow>, DbError> {
    let sql = format!(
        "UPDATE saved_carts SET items = $3, updated_at = NOW() \
         WHERE owner = $1 AND id = $2 \
         RETURNING {SAVED_CART_COLUMNS}"
    );
    let row = sqlx::query_as::<_, SavedCartRow>(&sql)
        .bind(owner)
        .bind(id)
        .bind(Json(items))
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Deletes the cart. Returns `false` when nothing was deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_saved_cart(pool: &PgPool, owner: &str, id: i64) -> Result<bool, DbError> {
    let rows_affected = sqlx::query("DELETE FROM saved_carts WHERE owner = $1 AND id = $2")
        .bind(owner)
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(rows_affected > 0)
}

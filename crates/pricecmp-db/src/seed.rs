use pricecmp_core::ChainConfig;
use sqlx::PgPool;

use crate::DbError;

/// Upsert chains from the catalog into the database.
///
/// Returns the number of chains processed (inserted or updated).
/// All upserts run inside a single transaction; if any operation fails
/// the entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_chains(pool: &PgPool, chains: &[ChainConfig]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for chain in chains {
        sqlx::query(
            "INSERT INTO chains (name, display_name, notes) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (name) DO UPDATE SET \
                 display_name = EXCLUDED.display_name, \
                 notes = EXCLUDED.notes, \
                 updated_at = NOW()",
        )
        .bind(&chain.name)
        .bind(&chain.display_name)
        .bind(&chain.notes)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}

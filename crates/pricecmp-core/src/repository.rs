//! Read-side port for shelf prices.
//!
//! The search and cart services depend only on this trait, so storage can be
//! swapped (Postgres in production, [`crate::InMemoryPriceRepository`] in
//! tests) without touching comparison logic.

use async_trait::async_trait;

use crate::normalize::SearchQuery;
use crate::prices::PriceRow;
use crate::RepositoryError;

/// Port for reading price rows scoped to one city.
#[async_trait]
pub trait PriceRepository: Send + Sync {
    /// Rows whose item name contains every token of `filter`, restricted to
    /// branches in `city`.
    ///
    /// `city` is already normalized and non-empty. An unknown city yields an
    /// empty vector rather than an error. Rows are ordered by item name,
    /// chain, then store.
    async fn fetch_prices(
        &self,
        city: &str,
        filter: &SearchQuery,
    ) -> Result<Vec<PriceRow>, RepositoryError>;

    /// Rows whose barcode is one of `barcodes`, restricted to `city`.
    async fn fetch_prices_for_barcodes(
        &self,
        city: &str,
        barcodes: &[String],
    ) -> Result<Vec<PriceRow>, RepositoryError>;
}

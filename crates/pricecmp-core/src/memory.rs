//! In-memory [`PriceRepository`] used by tests and local tooling.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::normalize::SearchQuery;
use crate::prices::PriceRow;
use crate::repository::PriceRepository;
use crate::RepositoryError;

/// Holds `(city, row)` pairs and counts every repository call.
///
/// City matching is case-insensitive, mirroring the Postgres adapter.
#[derive(Debug, Default)]
pub struct InMemoryPriceRepository {
    rows: Vec<(String, PriceRow)>,
    failure: Mutex<Option<RepositoryError>>,
    name_calls: AtomicUsize,
    barcode_calls: AtomicUsize,
}

impl InMemoryPriceRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_row(mut self, city: &str, row: PriceRow) -> Self {
        self.rows.push((city.to_string(), row));
        self
    }

    pub fn push(&mut self, city: &str, row: PriceRow) {
        self.rows.push((city.to_string(), row));
    }

    /// Makes every following call fail with `error`.
    pub fn fail_with(&self, error: RepositoryError) {
        if let Ok(mut slot) = self.failure.lock() {
            *slot = Some(error);
        }
    }

    /// Number of `fetch_prices` calls so far.
    #[must_use]
    pub fn name_calls(&self) -> usize {
        self.name_calls.load(Ordering::SeqCst)
    }

    /// Number of `fetch_prices_for_barcodes` calls so far.
    #[must_use]
    pub fn barcode_calls(&self) -> usize {
        self.barcode_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.name_calls() + self.barcode_calls()
    }

    fn check_failure(&self) -> Result<(), RepositoryError> {
        match self.failure.lock() {
            Ok(slot) => slot.clone().map_or(Ok(()), Err),
            Err(_) => Err(RepositoryError::Connection {
                message: "in-memory repository lock poisoned".to_string(),
            }),
        }
    }

    fn in_city<'a>(&'a self, city: &str) -> impl Iterator<Item = &'a PriceRow> {
        let city = city.to_lowercase();
        self.rows
            .iter()
            .filter(move |(row_city, _)| row_city.to_lowercase() == city)
            .map(|(_, row)| row)
    }
}

fn sort_rows(rows: &mut [PriceRow]) {
    rows.sort_by(|a, b| {
        (&a.item_name, &a.chain, &a.store).cmp(&(&b.item_name, &b.chain, &b.store))
    });
}

#[async_trait]
impl PriceRepository for InMemoryPriceRepository {
    async fn fetch_prices(
        &self,
        city: &str,
        filter: &SearchQuery,
    ) -> Result<Vec<PriceRow>, RepositoryError> {
        self.name_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let mut rows: Vec<PriceRow> = self
            .in_city(city)
            .filter(|row| row.item_name.as_deref().is_some_and(|name| filter.matches(name)))
            .cloned()
            .collect();
        sort_rows(&mut rows);
        Ok(rows)
    }

    async fn fetch_prices_for_barcodes(
        &self,
        city: &str,
        barcodes: &[String],
    ) -> Result<Vec<PriceRow>, RepositoryError> {
        self.barcode_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let mut rows: Vec<PriceRow> = self
            .in_city(city)
            .filter(|row| row.barcode().is_some_and(|code| barcodes.iter().any(|b| b == code)))
            .cloned()
            .collect();
        sort_rows(&mut rows);
        Ok(rows)
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// One stored price: a chain product on the shelf of one branch.
///
/// Rows come straight from the price repository and are never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRow {
    /// Chain key, e.g. `"shufersal"`.
    pub chain: String,
    /// Chain display name, e.g. `"שופרסל"`.
    pub chain_display_name: Option<String>,
    /// Chain-assigned store identifier (unique within the chain).
    pub store: String,
    pub store_name: Option<String>,
    /// Barcode. Optional because some feeds carry in-store items without one.
    pub item_code: Option<String>,
    pub item_name: Option<String>,
    pub price: Decimal,
    pub last_updated: DateTime<Utc>,
}

impl PriceRow {
    /// Barcode trimmed, or `None` when absent or blank.
    #[must_use]
    pub fn barcode(&self) -> Option<&str> {
        self.item_code
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// A single chain/store price inside a [`Product`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceEntry {
    pub chain: String,
    pub chain_display_name: Option<String>,
    pub store: String,
    pub store_name: Option<String>,
    pub price: Decimal,
    pub last_updated: DateTime<Utc>,
}

impl From<&PriceRow> for PriceEntry {
    fn from(row: &PriceRow) -> Self {
        Self {
            chain: row.chain.clone(),
            chain_display_name: row.chain_display_name.clone(),
            store: row.store.clone(),
            store_name: row.store_name.clone(),
            price: row.price,
            last_updated: row.last_updated,
        }
    }
}

/// The same product across every chain and store that prices it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    /// Barcode when known, otherwise the normalized item name.
    pub key: String,
    pub barcode: Option<String>,
    pub name: String,
    /// Ordered by `(chain, store)` ascending.
    pub prices: Vec<PriceEntry>,
}

impl Product {
    /// Summary statistics over all entries, or `None` when there are none.
    #[must_use]
    pub fn price_stats(&self) -> Option<PriceStats> {
        PriceStats::from_prices(self.prices.iter().map(|entry| entry.price))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceStats {
    #[serde(with = "rust_decimal::serde::float")]
    pub min_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub max_price: Decimal,
    /// Mean price rounded half-up to two decimals.
    #[serde(with = "rust_decimal::serde::float")]
    pub avg_price: Decimal,
    /// `max_price - min_price`; what a shopper saves by picking the cheapest store.
    #[serde(with = "rust_decimal::serde::float")]
    pub price_range: Decimal,
    pub available_in_stores: usize,
}

impl PriceStats {
    #[must_use]
    pub fn from_prices(prices: impl IntoIterator<Item = Decimal>) -> Option<Self> {
        let mut iter = prices.into_iter();
        let first = iter.next()?;

        let mut min_price = first;
        let mut max_price = first;
        let mut sum = first;
        let mut count: usize = 1;

        for price in iter {
            min_price = min_price.min(price);
            max_price = max_price.max(price);
            sum += price;
            count += 1;
        }

        let avg_price = (sum / Decimal::from(count))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        Some(Self {
            min_price,
            max_price,
            avg_price,
            price_range: max_price - min_price,
            available_in_stores: count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(item_code: Option<&str>) -> PriceRow {
        PriceRow {
            chain: "shufersal".to_string(),
            chain_display_name: Some("שופרסל".to_string()),
            store: "001".to_string(),
            store_name: None,
            item_code: item_code.map(str::to_string),
            item_name: Some("חלב טרה 3%".to_string()),
            price: Decimal::new(590, 2),
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn barcode_trims_and_filters_blank() {
        assert_eq!(row(Some(" 7290000000001 ")).barcode(), Some("7290000000001"));
        assert_eq!(row(Some("   ")).barcode(), None);
        assert_eq!(row(None).barcode(), None);
    }

    #[test]
    fn price_stats_empty_is_none() {
        assert!(PriceStats::from_prices(Vec::new()).is_none());
    }

    #[test]
    fn price_stats_single_price() {
        let stats = PriceStats::from_prices([Decimal::new(790, 2)]).expect("stats");
        assert_eq!(stats.min_price, Decimal::new(790, 2));
        assert_eq!(stats.max_price, Decimal::new(790, 2));
        assert_eq!(stats.avg_price, Decimal::new(790, 2));
        assert_eq!(stats.price_range, Decimal::ZERO);
        assert_eq!(stats.available_in_stores, 1);
    }

    #[test]
    fn price_stats_rounds_average_to_cents() {
        let stats = PriceStats::from_prices([
            Decimal::new(590, 2),
            Decimal::new(620, 2),
            Decimal::new(550, 2),
        ])
        .expect("stats");
        assert_eq!(stats.min_price, Decimal::new(550, 2));
        assert_eq!(stats.max_price, Decimal::new(620, 2));
        // (5.90 + 6.20 + 5.50) / 3 = 5.8666..
        assert_eq!(stats.avg_price, Decimal::new(587, 2));
        assert_eq!(stats.price_range, Decimal::new(70, 2));
        assert_eq!(stats.available_in_stores, 3);
    }

    #[test]
    fn price_stats_serialize_as_numbers() {
        let stats = PriceStats::from_prices([Decimal::new(790, 2)]).expect("stats");
        let json = serde_json::to_value(stats).expect("serialize");
        assert_eq!(json["min_price"].as_f64(), Some(7.9));
        assert_eq!(json["available_in_stores"].as_u64(), Some(1));
    }
}

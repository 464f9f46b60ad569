//! Groups raw price rows into cross-chain [`Product`] records.

use std::collections::HashMap;

use crate::normalize::normalize_name;
use crate::prices::{PriceEntry, PriceRow, Product};

/// Output of [`group_rows`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedProducts {
    /// Products in first-seen key order.
    pub products: Vec<Product>,
    /// Rows dropped because they carried neither a barcode nor a name.
    pub dropped_rows: usize,
}

/// Canonical key for a row: the barcode, else the normalized item name.
fn canonical_key(row: &PriceRow) -> Option<String> {
    row.barcode()
        .map(str::to_string)
        .or_else(|| row.item_name.as_deref().and_then(normalize_name))
}

/// Partitions `rows` by canonical key.
///
/// Groups appear in the order their key was first seen. Entries within a
/// group are sorted by `(chain, store)`. Every keyed row lands in exactly one
/// group; keyless rows are counted in [`GroupedProducts::dropped_rows`].
#[must_use]
pub fn group_rows(rows: &[PriceRow]) -> GroupedProducts {
    let mut products: Vec<Product> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();
    let mut dropped_rows = 0usize;

    for row in rows {
        let Some(key) = canonical_key(row) else {
            dropped_rows += 1;
            continue;
        };

        let idx = *index_by_key.entry(key.clone()).or_insert_with(|| {
            products.push(Product {
                barcode: row.barcode().map(str::to_string),
                name: String::new(),
                key,
                prices: Vec::new(),
            });
            products.len() - 1
        });

        let product = &mut products[idx];
        if product.name.is_empty() {
            if let Some(name) = row.item_name.as_deref().map(str::trim) {
                product.name = name.to_string();
            }
        }
        product.prices.push(PriceEntry::from(row));
    }

    for product in &mut products {
        if product.name.is_empty() {
            product.name.clone_from(&product.key);
        }
        product
            .prices
            .sort_by(|a, b| (&a.chain, &a.store).cmp(&(&b.chain, &b.store)));
    }

    if dropped_rows > 0 {
        tracing::warn!(
            dropped_rows,
            "price rows without barcode or name were dropped while grouping"
        );
    }

    GroupedProducts {
        products,
        dropped_rows,
    }
}

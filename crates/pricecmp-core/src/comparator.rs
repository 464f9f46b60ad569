//! Cross-chain cart price comparison.
//!
//! [`compare`] is pure: it takes the cart and the price rows already fetched
//! for each item, and never touches storage. The async wrapper that performs
//! the lookups lives in [`crate::service`].
//!
//! Eligibility policy: only a chain that prices **every** cart item can be
//! named cheapest. Chains with gaps are still reported with their partial
//! total and missing items, but a partial basket is never compared against a
//! full one.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::cart::{CartItem, CartTotal, ComparisonResult, ItemSelection};
use crate::prices::PriceRow;
use crate::ValidationError;

/// Largest quantity a single cart line may carry, after duplicates merge.
pub const MAX_ITEM_QUANTITY: i64 = 10_000;

/// Validates cart lines and merges duplicates.
///
/// Keys are trimmed. Lines with the same key are merged into the first
/// occurrence with their quantities summed.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyItemKey`] for a blank key (position is
/// zero-based), [`ValidationError::NonPositiveQuantity`] for a quantity
/// below 1, and [`ValidationError::QuantityTooLarge`] when a line, or the
/// merged total for a key, exceeds [`MAX_ITEM_QUANTITY`].
pub fn prepare_items(items: &[CartItem]) -> Result<Vec<CartItem>, ValidationError> {
    let mut merged: Vec<CartItem> = Vec::with_capacity(items.len());

    for (position, item) in items.iter().enumerate() {
        let key = item.item_key.trim();
        if key.is_empty() {
            return Err(ValidationError::EmptyItemKey { position });
        }
        if item.quantity < 1 {
            return Err(ValidationError::NonPositiveQuantity {
                item_key: key.to_string(),
                quantity: item.quantity,
            });
        }

        let quantity = if let Some(existing) = merged.iter_mut().find(|m| m.item_key == key) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
            if existing.name.is_none() {
                existing.name.clone_from(&item.name);
            }
            existing.quantity
        } else {
            merged.push(CartItem {
                item_key: key.to_string(),
                quantity: item.quantity,
                name: item.name.clone(),
            });
            item.quantity
        };

        if quantity > MAX_ITEM_QUANTITY {
            return Err(ValidationError::QuantityTooLarge {
                item_key: key.to_string(),
                quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
    }

    Ok(merged)
}

struct ChainAccumulator {
    display_name: Option<String>,
    selections: Vec<Option<ItemSelection>>,
}

/// Compares the cart across every chain present in `rows_by_item`.
///
/// `rows_by_item[i]` holds the price rows matching `items[i]` in `city`.
/// Items are expected to be validated by [`prepare_items`].
///
/// Per chain and item the cheapest store wins, ties going to the lower store
/// identifier. The cheapest chain is the complete chain with the lowest
/// total, ties going to the chain name that sorts first.
#[must_use]
pub fn compare(city: &str, items: &[CartItem], rows_by_item: &[Vec<PriceRow>]) -> ComparisonResult {
    debug_assert_eq!(items.len(), rows_by_item.len());

    let mut chains: BTreeMap<&str, ChainAccumulator> = BTreeMap::new();

    for (idx, (item, rows)) in items.iter().zip(rows_by_item).enumerate() {
        for row in rows {
            let acc = chains.entry(row.chain.as_str()).or_insert_with(|| ChainAccumulator {
                display_name: None,
                selections: vec![None; items.len()],
            });
            if acc.display_name.is_none() {
                acc.display_name.clone_from(&row.chain_display_name);
            }

            let slot = &mut acc.selections[idx];
            let better = match slot {
                None => true,
                Some(current) => {
                    (row.price, row.store.as_str()) < (current.unit_price, current.store.as_str())
                }
            };
            if better {
                *slot = Some(ItemSelection {
                    item_key: item.item_key.clone(),
                    item_name: row.item_name.clone(),
                    store: row.store.clone(),
                    store_name: row.store_name.clone(),
                    unit_price: row.price,
                    quantity: item.quantity,
                    line_total: row.price * Decimal::from(item.quantity),
                });
            }
        }
    }

    let mut all_stores: Vec<CartTotal> = chains
        .into_iter()
        .map(|(chain, acc)| build_total(chain, acc, items))
        .collect();

    all_stores.sort_by(|a, b| {
        a.missing_items
            .len()
            .cmp(&b.missing_items.len())
            .then_with(|| a.total_price.cmp(&b.total_price))
            .then_with(|| a.chain.cmp(&b.chain))
    });

    let cheapest = all_stores.iter().find(|t| t.is_complete()).cloned();

    let unavailable_items = items
        .iter()
        .zip(rows_by_item)
        .filter(|(_, rows)| rows.is_empty())
        .map(|(item, _)| item.item_key.clone())
        .collect();

    ComparisonResult {
        city: city.to_string(),
        total_items: items.len(),
        all_stores,
        cheapest,
        unavailable_items,
    }
}

fn build_total(chain: &str, acc: ChainAccumulator, items: &[CartItem]) -> CartTotal {
    let mut total_price = Decimal::ZERO;
    let mut missing_items = Vec::new();
    let mut selected = Vec::new();

    for (item, selection) in items.iter().zip(acc.selections) {
        match selection {
            Some(selection) => {
                total_price += selection.line_total;
                selected.push(selection);
            }
            None => missing_items.push(item.item_key.clone()),
        }
    }

    CartTotal {
        chain: chain.to_string(),
        chain_display_name: acc.display_name,
        total_price,
        matched_count: selected.len(),
        missing_items,
        items: selected,
    }
}

#[cfg(test)]
#[path = "comparator_test.rs"]
mod tests;

//! Async orchestration over a [`PriceRepository`]: product search, barcode
//! lookup, and cart comparison.
//!
//! Every entry point validates its input before the first repository call,
//! and a repository failure fails the whole request.

use crate::cart::{CartItem, ComparisonResult};
use crate::comparator::{compare, prepare_items};
use crate::grouper::group_rows;
use crate::normalize::{is_barcode, normalize_city, normalize_query, CityAliases};
use crate::prices::{PriceRow, Product};
use crate::repository::PriceRepository;
use crate::{ServiceError, ValidationError};

fn require_city(city: &str, aliases: &CityAliases) -> Result<String, ValidationError> {
    let city = normalize_city(city, aliases);
    if city.is_empty() {
        return Err(ValidationError::EmptyCity);
    }
    Ok(city)
}

/// Searches products by free text in one city.
///
/// An empty normalized query returns no products without touching the
/// repository. At most `limit` products are returned, in first-seen order.
///
/// # Errors
///
/// Returns [`ServiceError::Validation`] for a blank city and
/// [`ServiceError::Repository`] when the lookup fails.
pub async fn search_products(
    repo: &dyn PriceRepository,
    aliases: &CityAliases,
    query: &str,
    city: &str,
    limit: usize,
) -> Result<Vec<Product>, ServiceError> {
    let city = require_city(city, aliases)?;
    let filter = normalize_query(query);
    if filter.is_empty() {
        tracing::debug!(city = %city, "empty search query; skipping lookup");
        return Ok(Vec::new());
    }

    let rows = repo.fetch_prices(&city, &filter).await?;
    let mut products = group_rows(&rows).products;
    products.truncate(limit);

    tracing::debug!(
        city = %city,
        tokens = filter.tokens().len(),
        rows = rows.len(),
        products = products.len(),
        "product search complete"
    );
    Ok(products)
}

/// Looks up one product by barcode across every chain in `city`.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidBarcode`] when `barcode` is not all
/// digits, [`ValidationError::EmptyCity`] for a blank city, and
/// [`ServiceError::Repository`] when the lookup fails.
pub async fn product_by_barcode(
    repo: &dyn PriceRepository,
    aliases: &CityAliases,
    barcode: &str,
    city: &str,
) -> Result<Option<Product>, ServiceError> {
    let barcode = barcode.trim();
    if !is_barcode(barcode) {
        return Err(ValidationError::InvalidBarcode(barcode.to_string()).into());
    }
    let city = require_city(city, aliases)?;

    let rows = repo
        .fetch_prices_for_barcodes(&city, &[barcode.to_string()])
        .await?;
    Ok(group_rows(&rows)
        .products
        .into_iter()
        .find(|product| product.key == barcode))
}

/// Compares `items` across every chain with branches in `city`.
///
/// Barcode keys are fetched in one batched call; each name key is fetched
/// with its own normalized query. See [`crate::comparator`] for the
/// selection and eligibility rules.
///
/// # Errors
///
/// Returns [`ServiceError::Validation`] for a blank city, a blank item key,
/// or a non-positive quantity, and [`ServiceError::Repository`] when any
/// lookup fails.
pub async fn compare_cart(
    repo: &dyn PriceRepository,
    aliases: &CityAliases,
    city: &str,
    items: &[CartItem],
) -> Result<ComparisonResult, ServiceError> {
    let city = require_city(city, aliases)?;
    let items = prepare_items(items)?;
    if items.is_empty() {
        return Ok(ComparisonResult::empty(city, 0));
    }

    let rows_by_item = fetch_rows_by_item(repo, &city, &items).await?;
    let result = compare(&city, &items, &rows_by_item);

    tracing::info!(
        city = %result.city,
        items = result.total_items,
        chains = result.all_stores.len(),
        cheapest = result.cheapest.as_ref().map_or("none", |t| t.chain.as_str()),
        unavailable = result.unavailable_items.len(),
        "cart comparison complete"
    );
    Ok(result)
}

async fn fetch_rows_by_item(
    repo: &dyn PriceRepository,
    city: &str,
    items: &[CartItem],
) -> Result<Vec<Vec<PriceRow>>, ServiceError> {
    let barcodes: Vec<String> = items
        .iter()
        .filter(|item| item.is_barcode())
        .map(|item| item.item_key.clone())
        .collect();

    let barcode_rows = if barcodes.is_empty() {
        Vec::new()
    } else {
        repo.fetch_prices_for_barcodes(city, &barcodes).await?
    };

    let mut rows_by_item = Vec::with_capacity(items.len());
    for item in items {
        if item.is_barcode() {
            rows_by_item.push(
                barcode_rows
                    .iter()
                    .filter(|row| row.barcode() == Some(item.item_key.as_str()))
                    .cloned()
                    .collect(),
            );
            continue;
        }

        let filter = normalize_query(&item.item_key);
        if filter.is_empty() {
            rows_by_item.push(Vec::new());
            continue;
        }
        rows_by_item.push(repo.fetch_prices(city, &filter).await?);
    }

    Ok(rows_by_item)
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;

//! Read-only search and comparison commands.

use pricecmp_core::{CartItem, CityAliases, ComparisonResult, Product};
use pricecmp_db::PgPriceRepository;
use rust_decimal::Decimal;

const NAME_WIDTH: usize = 40;

/// Parses `key` or `key:quantity`.
///
/// The quantity is taken from the text after the last `:` only when it
/// parses as an integer, so names containing `:` stay intact.
///
/// # Errors
///
/// Returns an error for a blank key.
pub(crate) fn parse_cart_arg(arg: &str) -> anyhow::Result<CartItem> {
    let (key, quantity) = match arg.rsplit_once(':') {
        Some((key, qty)) => match qty.trim().parse::<i64>() {
            Ok(quantity) => (key, quantity),
            Err(_) => (arg, 1),
        },
        None => (arg, 1),
    };

    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("cart item '{arg}' has an empty key");
    }
    Ok(CartItem::new(key, quantity))
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        format!("{}...", text.chars().take(width).collect::<String>())
    } else {
        text.to_string()
    }
}

fn fmt_price(price: Decimal) -> String {
    format!("{:.2}", price.round_dp(2))
}

pub(crate) fn format_products(products: &[Product]) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<16}{:<44}{:>8}{:>8}{:>8}",
        "BARCODE", "NAME", "MIN", "MAX", "STORES"
    )];
    for product in products {
        let Some(stats) = product.price_stats() else {
            continue;
        };
        lines.push(format!(
            "{:<16}{:<44}{:>8}{:>8}{:>8}",
            product.barcode.as_deref().unwrap_or("-"),
            truncate(&product.name, NAME_WIDTH),
            fmt_price(stats.min_price),
            fmt_price(stats.max_price),
            stats.available_in_stores
        ));
    }
    lines
}

pub(crate) fn format_comparison(result: &ComparisonResult) -> Vec<String> {
    let mut lines = vec![format!("{} items in {}", result.total_items, result.city)];

    match &result.cheapest {
        Some(cheapest) => lines.push(format!(
            "cheapest: {} {}",
            cheapest.chain,
            fmt_price(cheapest.total_price)
        )),
        None => lines.push("cheapest: none (no chain carries every item)".to_string()),
    }

    for total in &result.all_stores {
        let mut line = format!(
            "  {:<16}{:>10}  {}/{} items",
            total.chain,
            fmt_price(total.total_price),
            total.matched_count,
            result.total_items
        );
        if !total.missing_items.is_empty() {
            line.push_str(&format!("  missing: {}", total.missing_items.join(", ")));
        }
        lines.push(line);
    }

    if !result.unavailable_items.is_empty() {
        lines.push(format!(
            "unavailable everywhere: {}",
            result.unavailable_items.join(", ")
        ));
    }
    lines
}

/// Prints products matching `query` in `city`.
///
/// # Errors
///
/// Returns an error for a blank city or a failed lookup.
pub(crate) async fn run_search(
    pool: &sqlx::PgPool,
    aliases: &CityAliases,
    city: &str,
    query: &str,
    limit: usize,
) -> anyhow::Result<()> {
    let repo = PgPriceRepository::new(pool.clone());
    let products = pricecmp_core::search_products(&repo, aliases, query, city, limit).await?;
    tracing::debug!(city, query, products = products.len(), "search finished");

    if products.is_empty() {
        println!("no products match '{query}' in {city}");
        return Ok(());
    }
    for line in format_products(&products) {
        println!("{line}");
    }
    Ok(())
}

/// Prints per-chain totals for `items` in `city`.
///
/// # Errors
///
/// Returns an error for a blank city, an invalid item, or a failed lookup.
pub(crate) async fn run_compare(
    pool: &sqlx::PgPool,
    aliases: &CityAliases,
    city: &str,
    items: &[CartItem],
) -> anyhow::Result<()> {
    let repo = PgPriceRepository::new(pool.clone());
    let result = pricecmp_core::compare_cart(&repo, aliases, city, items).await?;
    tracing::info!(
        city = %result.city,
        items = result.total_items,
        chains = result.all_stores.len(),
        cheapest = result.cheapest.as_ref().map_or("none", |c| c.chain.as_str()),
        "cart compared"
    );

    for line in format_comparison(&result) {
        println!("{line}");
    }
    Ok(())
}

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;

use super::*;
use crate::memory::InMemoryPriceRepository;
use crate::RepositoryError;

const TLV: &str = "תל אביב";
const MILK: &str = "7290000000001";
const BREAD: &str = "7290000000002";

fn row(chain: &str, store: &str, code: Option<&str>, name: &str, cents: i64) -> PriceRow {
    PriceRow {
        chain: chain.to_string(),
        chain_display_name: None,
        store: store.to_string(),
        store_name: None,
        item_code: code.map(str::to_string),
        item_name: Some(name.to_string()),
        price: Decimal::new(cents, 2),
        last_updated: Utc.with_ymd_and_hms(2025, 3, 1, 6, 0, 0).unwrap(),
    }
}

fn two_chain_basket_repo() -> InMemoryPriceRepository {
    InMemoryPriceRepository::new()
        .with_row(TLV, row("shufersal", "001", Some(MILK), "חלב טרה 3% 1 ליטר", 790))
        .with_row(TLV, row("victory", "001", Some(MILK), "חלב טרה 3%", 850))
        .with_row(TLV, row("shufersal", "001", Some(BREAD), "לחם אחיד פרוס", 590))
        .with_row(TLV, row("victory", "001", Some(BREAD), "לחם אחיד", 550))
        .with_row("חיפה", row("shufersal", "050", Some(MILK), "חלב טרה 3%", 100))
}

fn aliases() -> CityAliases {
    CityAliases::builtin()
}

// -----------------------------------------------------------------------
// search_products
// -----------------------------------------------------------------------

#[tokio::test]
async fn empty_query_returns_nothing_without_repository_calls() {
    let repo = two_chain_basket_repo();
    for query in ["", "   ", "\t\n"] {
        let products = search_products(&repo, &aliases(), query, TLV, 20)
            .await
            .expect("search");
        assert!(products.is_empty());
    }
    assert_eq!(repo.total_calls(), 0);
}

#[tokio::test]
async fn search_groups_rows_by_barcode_and_scopes_to_city() {
    let repo = two_chain_basket_repo();
    let products = search_products(&repo, &aliases(), "חלב טרה 1 ליטר", TLV, 20)
        .await
        .expect("search");

    assert_eq!(repo.name_calls(), 1);
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].key, MILK);
    assert_eq!(products[0].prices.len(), 2, "haifa row is excluded");
}

#[tokio::test]
async fn search_resolves_city_aliases() {
    let repo = two_chain_basket_repo();
    let products = search_products(&repo, &aliases(), "לחם", "  Tel   Aviv ", 20)
        .await
        .expect("search");
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].key, BREAD);
}

#[tokio::test]
async fn search_truncates_to_limit() {
    let repo = two_chain_basket_repo();
    let products = search_products(&repo, &aliases(), "ל", TLV, 1)
        .await
        .expect("search");
    assert_eq!(products.len(), 1);
}

#[tokio::test]
async fn search_rejects_blank_city_before_lookup() {
    let repo = two_chain_basket_repo();
    let err = search_products(&repo, &aliases(), "חלב", "  ", 20)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ValidationError::EmptyCity)));
    assert_eq!(repo.total_calls(), 0);
}

#[tokio::test]
async fn search_propagates_repository_failure() {
    let repo = two_chain_basket_repo();
    repo.fail_with(RepositoryError::Query {
        message: "boom".to_string(),
    });
    let err = search_products(&repo, &aliases(), "חלב", TLV, 20)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Repository(RepositoryError::Query { .. })));
}

// -----------------------------------------------------------------------
// product_by_barcode
// -----------------------------------------------------------------------

#[tokio::test]
async fn product_by_barcode_returns_all_city_prices() {
    let repo = two_chain_basket_repo();
    let product = product_by_barcode(&repo, &aliases(), MILK, TLV)
        .await
        .expect("lookup")
        .expect("product exists");
    assert_eq!(product.prices.len(), 2);
    let stats = product.price_stats().expect("stats");
    assert_eq!(stats.min_price, Decimal::new(790, 2));
    assert_eq!(stats.max_price, Decimal::new(850, 2));
}

#[tokio::test]
async fn product_by_barcode_unknown_is_none() {
    let repo = two_chain_basket_repo();
    let product = product_by_barcode(&repo, &aliases(), "7290000000999", TLV)
        .await
        .expect("lookup");
    assert!(product.is_none());
}

#[tokio::test]
async fn product_by_barcode_rejects_non_digits() {
    let repo = two_chain_basket_repo();
    let err = product_by_barcode(&repo, &aliases(), "72900abc", TLV)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::InvalidBarcode(_))
    ));
    assert_eq!(repo.total_calls(), 0);
}

// -----------------------------------------------------------------------
// compare_cart
// -----------------------------------------------------------------------

#[tokio::test]
async fn compare_cart_picks_cheapest_complete_chain() {
    let repo = two_chain_basket_repo();
    let items = vec![CartItem::new(MILK, 2), CartItem::new(BREAD, 1)];

    let result = compare_cart(&repo, &aliases(), TLV, &items)
        .await
        .expect("compare");

    assert_eq!(repo.barcode_calls(), 1, "barcodes are batched");
    assert_eq!(repo.name_calls(), 0);
    let cheapest = result.cheapest.expect("cheapest");
    assert_eq!(cheapest.chain, "shufersal");
    assert_eq!(cheapest.total_price, Decimal::new(2170, 2));
    assert_eq!(result.all_stores[1].total_price, Decimal::new(2250, 2));
}

#[tokio::test]
async fn compare_cart_empty_cart_makes_no_calls() {
    let repo = two_chain_basket_repo();
    let result = compare_cart(&repo, &aliases(), TLV, &[])
        .await
        .expect("compare");
    assert_eq!(result.total_items, 0);
    assert!(result.cheapest.is_none());
    assert!(result.all_stores.is_empty());
    assert_eq!(repo.total_calls(), 0);
}

#[tokio::test]
async fn compare_cart_unknown_city_is_empty_success() {
    let repo = two_chain_basket_repo();
    let items = vec![CartItem::new(MILK, 1)];
    let result = compare_cart(&repo, &aliases(), "אילת", &items)
        .await
        .expect("compare");
    assert!(result.all_stores.is_empty());
    assert!(result.cheapest.is_none());
    assert_eq!(result.unavailable_items, vec![MILK]);
}

#[tokio::test]
async fn compare_cart_rejects_bad_quantity_before_lookup() {
    let repo = two_chain_basket_repo();
    let items = vec![CartItem::new(MILK, 1), CartItem::new(BREAD, 0)];
    let err = compare_cart(&repo, &aliases(), TLV, &items)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::NonPositiveQuantity { quantity: 0, .. })
    ));
    assert_eq!(repo.total_calls(), 0);
}

#[tokio::test]
async fn compare_cart_rejects_blank_city() {
    let repo = two_chain_basket_repo();
    let err = compare_cart(&repo, &aliases(), "", &[CartItem::new(MILK, 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ValidationError::EmptyCity)));
}

#[tokio::test]
async fn compare_cart_fetches_each_name_item_separately() {
    let repo = two_chain_basket_repo();
    let items = vec![
        CartItem::new("חלב טרה", 1),
        CartItem::new("לחם אחיד", 2),
        CartItem::new(MILK, 1),
    ];

    let result = compare_cart(&repo, &aliases(), TLV, &items)
        .await
        .expect("compare");

    assert_eq!(repo.name_calls(), 2);
    assert_eq!(repo.barcode_calls(), 1);
    let cheapest = result.cheapest.expect("both chains are complete");
    // shufersal: 7.90 + 5.90 * 2 + 7.90 = 27.60; victory: 8.50 + 5.50 * 2 + 8.50 = 28.00
    assert_eq!(cheapest.chain, "shufersal");
    assert_eq!(cheapest.total_price, Decimal::new(2760, 2));
}

#[tokio::test]
async fn compare_cart_merges_duplicate_keys() {
    let repo = two_chain_basket_repo();
    let items = vec![CartItem::new(MILK, 1), CartItem::new(MILK, 1)];
    let result = compare_cart(&repo, &aliases(), TLV, &items)
        .await
        .expect("compare");
    assert_eq!(result.total_items, 1);
    assert_eq!(result.cheapest.expect("cheapest").total_price, Decimal::new(1580, 2));
}

#[tokio::test]
async fn compare_cart_propagates_repository_failure() {
    let repo = two_chain_basket_repo();
    repo.fail_with(RepositoryError::Connection {
        message: "pool timed out".to_string(),
    });
    let err = compare_cart(&repo, &aliases(), TLV, &[CartItem::new(MILK, 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Repository(_)));
}

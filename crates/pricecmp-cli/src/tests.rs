use super::*;
use pricecmp_core::{CartItem, CartTotal, ComparisonResult, PriceEntry, Product};
use rust_decimal::Decimal;

#[test]
fn parses_migrate_command() {
    let cli = Cli::try_parse_from(["pricecmp-cli", "migrate"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Migrate)));
}

#[test]
fn parses_seed_command() {
    let cli = Cli::try_parse_from(["pricecmp-cli", "seed"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Seed)));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["pricecmp-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn migration_summary_reports_newly_applied_count() {
    assert_eq!(migration_summary(0), "database schema is up to date");
    assert_eq!(migration_summary(1), "1 new migration applied");
    assert_eq!(migration_summary(2), "2 new migrations applied");
}

#[test]
fn parses_import_path() {
    let cli = Cli::try_parse_from(["pricecmp-cli", "import", "prices/haifa.json"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Import { ref path }) if path == &PathBuf::from("prices/haifa.json")
    ));
}

#[test]
fn parses_search_with_multi_word_query() {
    let cli = Cli::try_parse_from([
        "pricecmp-cli",
        "search",
        "--city",
        "Tel Aviv",
        "חלב",
        "תנובה",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Some(Commands::Search { city, limit, query }) => {
            assert_eq!(city, "Tel Aviv");
            assert_eq!(limit, None);
            assert_eq!(query, vec!["חלב".to_string(), "תנובה".to_string()]);
        }
        other => panic!("expected search command, got {other:?}"),
    }
}

#[test]
fn search_requires_city_and_query() {
    assert!(Cli::try_parse_from(["pricecmp-cli", "search", "milk"]).is_err());
    assert!(Cli::try_parse_from(["pricecmp-cli", "search", "--city", "haifa"]).is_err());
}

#[test]
fn parses_compare_items() {
    let cli = Cli::try_parse_from([
        "pricecmp-cli",
        "compare",
        "--city",
        "haifa",
        "7290000000001:2",
        "bread",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Compare { ref city, ref items }) if city == "haifa" && items.len() == 2
    ));
}

// ---------------------------------------------------------------------------
// Cart argument parsing
// ---------------------------------------------------------------------------

#[test]
fn cart_arg_without_quantity_defaults_to_one() {
    let item = query::parse_cart_arg("7290000000001").expect("valid item");
    assert_eq!(item, CartItem::new("7290000000001", 1));
}

#[test]
fn cart_arg_with_quantity() {
    let item = query::parse_cart_arg("7290000000001:3").expect("valid item");
    assert_eq!(item, CartItem::new("7290000000001", 3));
}

#[test]
fn cart_arg_keeps_colon_in_names() {
    let item = query::parse_cart_arg("milk: 3% fat").expect("valid item");
    assert_eq!(item.item_key, "milk: 3% fat");
    assert_eq!(item.quantity, 1);
}

#[test]
fn cart_arg_passes_zero_quantity_through_for_validation() {
    let item = query::parse_cart_arg("bread:0").expect("parsed");
    assert_eq!(item.quantity, 0);
}

#[test]
fn cart_arg_rejects_blank_key() {
    assert!(query::parse_cart_arg("  :2").is_err());
    assert!(query::parse_cart_arg("").is_err());
}

// ---------------------------------------------------------------------------
// Import file parsing
// ---------------------------------------------------------------------------

#[test]
fn price_file_accepts_string_and_number_prices() {
    let records = import::parse_price_file(
        r#"[
            {"chain": "shufersal", "store_id": "001", "city": "חיפה",
             "barcode": "7290000000001", "name": "חלב", "price": "7.90"},
            {"chain": "victory", "store_id": "012", "store_name": "ויקטורי חיפה",
             "city": "haifa", "barcode": "7290000000001", "name": "חלב", "price": 8.5}
        ]"#,
    )
    .expect("valid price file");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].price, Decimal::new(790, 2));
    assert_eq!(records[1].price, Decimal::new(85, 1));
    assert_eq!(records[1].store_name.as_deref(), Some("ויקטורי חיפה"));
}

#[test]
fn price_file_rejects_non_array() {
    assert!(import::parse_price_file(r#"{"chain": "shufersal"}"#).is_err());
}

// ---------------------------------------------------------------------------
// Output formatting
// ---------------------------------------------------------------------------

fn entry(chain: &str, store: &str, cents: i64) -> PriceEntry {
    PriceEntry {
        chain: chain.to_string(),
        chain_display_name: None,
        store: store.to_string(),
        store_name: None,
        price: Decimal::new(cents, 2),
        last_updated: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
    }
}

#[test]
fn product_table_lists_price_range() {
    let products = vec![Product {
        key: "7290000000001".to_string(),
        barcode: Some("7290000000001".to_string()),
        name: "Tara Milk 3% 1L".to_string(),
        prices: vec![entry("shufersal", "001", 790), entry("victory", "001", 850)],
    }];

    let lines = query::format_products(&products);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("BARCODE"));
    assert!(lines[1].contains("Tara Milk 3% 1L"));
    assert!(lines[1].contains("7.90"));
    assert!(lines[1].contains("8.50"));
}

#[test]
fn comparison_without_complete_chain_says_so() {
    let result = ComparisonResult {
        city: "חיפה".to_string(),
        total_items: 2,
        all_stores: vec![CartTotal {
            chain: "victory".to_string(),
            chain_display_name: None,
            total_price: Decimal::new(550, 2),
            matched_count: 1,
            missing_items: vec!["7290000000001".to_string()],
            items: Vec::new(),
        }],
        cheapest: None,
        unavailable_items: Vec::new(),
    };

    let lines = query::format_comparison(&result);
    assert_eq!(lines[0], "2 items in חיפה");
    assert!(lines[1].starts_with("cheapest: none"));
    assert!(lines[2].contains("5.50"));
    assert!(lines[2].contains("1/2 items"));
    assert!(lines[2].contains("missing: 7290000000001"));
}

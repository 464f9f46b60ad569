use super::*;

// -----------------------------------------------------------------------
// normalize_query
// -----------------------------------------------------------------------

#[test]
fn empty_query_is_empty() {
    assert!(normalize_query("").is_empty());
}

#[test]
fn whitespace_query_is_empty() {
    assert!(normalize_query("   \t\n ").is_empty());
}

#[test]
fn punctuation_only_query_is_empty() {
    assert!(normalize_query(" - / , ").is_empty());
}

#[test]
fn empty_query_matches_nothing() {
    let query = normalize_query("");
    assert!(!query.matches("חלב טרה 3%"));
    assert!(!query.matches(""));
}

#[test]
fn query_is_case_folded() {
    let query = normalize_query("Coca COLA");
    assert_eq!(query.tokens(), ["coca", "cola"]);
}

#[test]
fn size_and_unit_tokens_are_stripped() {
    let query = normalize_query("חלב תנובה 3% 1 ליטר");
    assert_eq!(query.tokens(), ["חלב", "תנובה"]);
}

#[test]
fn attached_units_are_stripped() {
    let query = normalize_query("Bamba 80g");
    assert_eq!(query.tokens(), ["bamba"]);

    let query = normalize_query("שמן זית 750מל");
    assert_eq!(query.tokens(), ["שמן", "זית"]);
}

#[test]
fn hebrew_abbreviated_units_are_stripped() {
    let query = normalize_query("קוטג' 250 גרם");
    assert_eq!(query.tokens(), ["קוטג"]);

    let query = normalize_query("סוכר 1 ק\"ג");
    assert_eq!(query.tokens(), ["סוכר"]);
}

#[test]
fn decimal_quantities_are_stripped() {
    let query = normalize_query("coke 1.5 l");
    assert_eq!(query.tokens(), ["coke"]);

    let query = normalize_query("coke 1,5l");
    assert_eq!(query.tokens(), ["coke"]);
}

#[test]
fn noise_only_query_keeps_raw_tokens() {
    let query = normalize_query("3%");
    assert_eq!(query.tokens(), ["3%"]);
}

#[test]
fn duplicate_tokens_are_removed() {
    let query = normalize_query("milk Milk MILK bread");
    assert_eq!(query.tokens(), ["milk", "bread"]);
}

#[test]
fn trailing_punctuation_is_trimmed() {
    let query = normalize_query("\"milk\", bread.");
    assert_eq!(query.tokens(), ["milk", "bread"]);
}

#[test]
fn matches_requires_every_token() {
    let query = normalize_query("חלב טרה");
    assert!(query.matches("חלב טרה 3% 1 ליטר"));
    assert!(!query.matches("חלב תנובה 3%"));
}

#[test]
fn matches_is_case_insensitive() {
    let query = normalize_query("cola");
    assert!(query.matches("Coca-Cola Zero 1.5L"));
}

// -----------------------------------------------------------------------
// normalize_name / is_barcode
// -----------------------------------------------------------------------

#[test]
fn normalize_name_collapses_and_lowercases() {
    assert_eq!(
        normalize_name("  Coca   Cola\tZero "),
        Some("coca cola zero".to_string())
    );
}

#[test]
fn normalize_name_blank_is_none() {
    assert_eq!(normalize_name("   "), None);
}

#[test]
fn is_barcode_accepts_digits() {
    assert!(is_barcode("7290000000001"));
    assert!(is_barcode(" 7290000000001 "));
}

#[test]
fn is_barcode_rejects_names_and_blank() {
    assert!(!is_barcode("חלב"));
    assert!(!is_barcode("729-000"));
    assert!(!is_barcode(""));
    assert!(!is_barcode("   "));
}

// -----------------------------------------------------------------------
// city aliases
// -----------------------------------------------------------------------

#[test]
fn builtin_aliases_map_latin_names() {
    let aliases = CityAliases::builtin();
    assert_eq!(normalize_city("Tel Aviv", &aliases), "תל אביב");
    assert_eq!(normalize_city("  jerusalem ", &aliases), "ירושלים");
    assert_eq!(normalize_city("HAIFA", &aliases), "חיפה");
    assert_eq!(normalize_city("Tel Aviv-Yafo", &aliases), "תל אביב");
}

#[test]
fn builtin_aliases_map_hebrew_variants() {
    let aliases = CityAliases::builtin();
    assert_eq!(normalize_city("תל  אביב   יפו", &aliases), "תל אביב");
}

#[test]
fn unknown_city_is_collapsed_but_kept() {
    let aliases = CityAliases::builtin();
    assert_eq!(normalize_city("  באר   שבע ", &aliases), "באר שבע");
}

#[test]
fn blank_city_normalizes_to_empty() {
    let aliases = CityAliases::builtin();
    assert_eq!(normalize_city("   ", &aliases), "");
}

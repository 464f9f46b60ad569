//! Text normalization for search queries, product names, and city names.
//!
//! Queries arrive in mixed Hebrew/Latin script with size and unit noise
//! (`"חלב תנובה 3% 1 ליטר"`). Normalization keeps only the tokens that say
//! *what* the product is, so name matching is not defeated by how a chain
//! happens to format pack sizes.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Number, optionally followed by a size/unit suffix: `1`, `1.5`, `500g`, `3%`, `1ליטר`.
static QUANTITY_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^\d+(?:[.,]\d+)?(?:%|ml|l|g|gr|kg|liter|litre|מ"ל|מל|ליטר|ל|גרם|גר|ג|ק"ג|קג|יח'?)?$"#,
    )
    .expect("valid quantity token regex")
});

const UNIT_WORDS: &[&str] = &[
    "g", "gr", "kg", "ml", "l", "liter", "litre", "גרם", "גר", "ג", "ק\"ג", "קג", "מ\"ל", "מל",
    "ליטר", "ל", "יח", "יח'", "יחידות",
];

/// Characters kept inside a token: decimal separators, percent, and the
/// Hebrew abbreviation marks in `מ"ל` / `ק"ג`.
fn is_token_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '%' | '.' | ',' | '"' | '\'')
}

/// A normalized free-text product query.
///
/// An empty query matches nothing. Callers must short-circuit on
/// [`SearchQuery::is_empty`] instead of issuing an unfiltered lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    tokens: Vec<String>,
}

impl SearchQuery {
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns `true` when `name` contains every token (case-insensitive).
    /// An empty query never matches.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        if self.tokens.is_empty() {
            return false;
        }
        let lower = name.to_lowercase();
        self.tokens.iter().all(|token| lower.contains(token.as_str()))
    }
}

/// Normalizes a free-text query into search tokens.
///
/// Lowercases, splits on whitespace and punctuation, drops size/unit noise,
/// and removes duplicate tokens. When every token is noise, the raw tokens
/// are kept so that a query like `"3%"` still searches for something.
#[must_use]
pub fn normalize_query(raw: &str) -> SearchQuery {
    let lower = raw.to_lowercase();

    let mut raw_tokens: Vec<String> = Vec::new();
    for piece in lower.split(|c: char| !is_token_char(c)) {
        let token = piece.trim_matches(|c: char| matches!(c, '.' | ',' | '"' | '\''));
        if !token.is_empty() && !raw_tokens.iter().any(|t| t == token) {
            raw_tokens.push(token.to_string());
        }
    }

    let content: Vec<String> = raw_tokens
        .iter()
        .filter(|token| !is_noise_token(token))
        .cloned()
        .collect();

    let tokens = if content.is_empty() {
        raw_tokens
    } else {
        content
    };

    SearchQuery { tokens }
}

fn is_noise_token(token: &str) -> bool {
    UNIT_WORDS.contains(&token) || QUANTITY_TOKEN.is_match(token)
}

/// Lowercases and collapses internal whitespace. Returns `None` for blank input.
#[must_use]
pub fn normalize_name(name: &str) -> Option<String> {
    let collapsed = collapse_whitespace(name).to_lowercase();
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Returns `true` when the cart item key looks like a barcode (digits only).
#[must_use]
pub fn is_barcode(key: &str) -> bool {
    let trimmed = key.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-insensitive mapping from alternate city spellings to the canonical
/// city stored on branches.
#[derive(Debug, Clone, Default)]
pub struct CityAliases {
    map: HashMap<String, String>,
}

impl CityAliases {
    /// Aliases every deployment understands regardless of catalog contents.
    #[must_use]
    pub fn builtin() -> Self {
        let mut aliases = Self::default();
        aliases.insert("tel aviv", "תל אביב");
        aliases.insert("תל אביב יפו", "תל אביב");
        aliases.insert("תל אביב-יפו", "תל אביב");
        aliases.insert("tel aviv-yafo", "תל אביב");
        aliases.insert("jerusalem", "ירושלים");
        aliases.insert("haifa", "חיפה");
        aliases
    }

    pub fn insert(&mut self, alias: &str, canonical: &str) {
        self.map.insert(
            collapse_whitespace(alias).to_lowercase(),
            collapse_whitespace(canonical),
        );
    }

    /// Collapses whitespace and maps known aliases to their canonical city.
    /// Unknown cities are returned as-is (whitespace collapsed).
    #[must_use]
    pub fn resolve(&self, city: &str) -> String {
        let collapsed = collapse_whitespace(city);
        self.map
            .get(&collapsed.to_lowercase())
            .cloned()
            .unwrap_or(collapsed)
    }
}

/// Normalizes a caller-supplied city. Empty output means the city was blank.
#[must_use]
pub fn normalize_city(city: &str, aliases: &CityAliases) -> String {
    aliases.resolve(city)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;

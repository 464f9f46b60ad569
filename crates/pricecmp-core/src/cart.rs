use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::normalize::is_barcode;

/// One requested line of a shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Barcode, or a product name when the caller has no barcode.
    #[serde(alias = "barcode")]
    pub item_key: String,
    /// Must be at least 1; validated before comparison starts.
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    /// Display name supplied by the caller, kept for saved carts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn default_quantity() -> i64 {
    1
}

impl CartItem {
    #[must_use]
    pub fn new(item_key: impl Into<String>, quantity: i64) -> Self {
        Self {
            item_key: item_key.into(),
            quantity,
            name: None,
        }
    }

    #[must_use]
    pub fn is_barcode(&self) -> bool {
        is_barcode(&self.item_key)
    }
}

/// The store a chain would fulfil one cart item from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSelection {
    pub item_key: String,
    pub item_name: Option<String>,
    pub store: String,
    pub store_name: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i64,
    pub line_total: Decimal,
}

/// What the cart costs at one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartTotal {
    pub chain: String,
    pub chain_display_name: Option<String>,
    /// Sum of `unit_price * quantity` over the items this chain prices.
    pub total_price: Decimal,
    pub matched_count: usize,
    /// Requested item keys this chain does not price, in cart order.
    pub missing_items: Vec<String>,
    /// One selection per matched item, in cart order.
    pub items: Vec<ItemSelection>,
}

impl CartTotal {
    /// A chain is complete when it prices every requested item.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonResult {
    pub city: String,
    pub total_items: usize,
    /// Complete chains first, then by total price, then by chain name.
    pub all_stores: Vec<CartTotal>,
    /// Cheapest complete chain. `None` when no chain prices the whole cart.
    pub cheapest: Option<CartTotal>,
    /// Item keys no chain in the city prices.
    pub unavailable_items: Vec<String>,
}

impl ComparisonResult {
    #[must_use]
    pub fn empty(city: impl Into<String>, total_items: usize) -> Self {
        Self {
            city: city.into(),
            total_items,
            all_stores: Vec::new(),
            cheapest: None,
            unavailable_items: Vec::new(),
        }
    }
}

use axum::{extract::State, Extension, Json};
use pricecmp_core::{CartItem, CartTotal, ComparisonResult, ItemSelection};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_service_error, ApiError, ApiResponse, AppState, ResponseMeta};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct CompareCartRequest {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct CompareCartResponse {
    success: bool,
    total_items: usize,
    city: String,
    cheapest_store: Option<CheapestStore>,
    all_stores: Vec<ChainTotalItem>,
    unavailable_items: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct CheapestStore {
    chain_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    total_price: Decimal,
}

#[derive(Debug, Serialize)]
pub(super) struct ChainTotalItem {
    chain_name: String,
    chain_display_name: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    total_price: Decimal,
    matched_count: usize,
    missing_items: Vec<String>,
    items: Vec<SelectedItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct SelectedItem {
    item_key: String,
    item_name: Option<String>,
    store: String,
    store_name: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    unit_price: Decimal,
    quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    line_total: Decimal,
}

impl From<ItemSelection> for SelectedItem {
    fn from(selection: ItemSelection) -> Self {
        Self {
            item_key: selection.item_key,
            item_name: selection.item_name,
            store: selection.store,
            store_name: selection.store_name,
            unit_price: selection.unit_price,
            quantity: selection.quantity,
            line_total: selection.line_total,
        }
    }
}

impl From<CartTotal> for ChainTotalItem {
    fn from(total: CartTotal) -> Self {
        Self {
            chain_name: total.chain,
            chain_display_name: total.chain_display_name,
            total_price: total.total_price,
            matched_count: total.matched_count,
            missing_items: total.missing_items,
            items: total.items.into_iter().map(SelectedItem::from).collect(),
        }
    }
}

impl From<ComparisonResult> for CompareCartResponse {
    fn from(result: ComparisonResult) -> Self {
        Self {
            success: true,
            total_items: result.total_items,
            city: result.city,
            cheapest_store: result.cheapest.map(|total| CheapestStore {
                chain_name: total.chain,
                total_price: total.total_price,
            }),
            all_stores: result
                .all_stores
                .into_iter()
                .map(ChainTotalItem::from)
                .collect(),
            unavailable_items: result.unavailable_items,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Runs the comparison and wraps it in the response envelope.
pub(super) async fn run_comparison(
    state: &AppState,
    req_id: RequestId,
    city: &str,
    items: &[CartItem],
) -> Result<Json<ApiResponse<CompareCartResponse>>, ApiError> {
    let result = pricecmp_core::compare_cart(state.prices.as_ref(), &state.city_aliases, city, items)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), e))?;

    Ok(Json(ApiResponse {
        data: CompareCartResponse::from(result),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/cart/compare
pub(super) async fn compare(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CompareCartRequest>,
) -> Result<Json<ApiResponse<CompareCartResponse>>, ApiError> {
    run_comparison(&state, req_id, &body.city, &body.items).await
}

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use pricecmp_core::{PriceStats, Product};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_service_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ProductItem {
    barcode: Option<String>,
    name: String,
    prices_by_store: Vec<StorePriceItem>,
    price_stats: Option<PriceStats>,
}

#[derive(Debug, Serialize)]
pub(super) struct StorePriceItem {
    chain: String,
    chain_display_name: Option<String>,
    store: String,
    store_name: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    last_updated: DateTime<Utc>,
    /// Set on every entry at the product's lowest price.
    is_cheapest: bool,
}

impl From<Product> for ProductItem {
    fn from(product: Product) -> Self {
        let price_stats = product.price_stats();
        let cheapest = price_stats.map(|stats| stats.min_price);

        let prices_by_store = product
            .prices
            .into_iter()
            .map(|entry| StorePriceItem {
                is_cheapest: Some(entry.price) == cheapest,
                chain: entry.chain,
                chain_display_name: entry.chain_display_name,
                store: entry.store,
                store_name: entry.store_name,
                price: entry.price,
                last_updated: entry.last_updated,
            })
            .collect();

        Self {
            barcode: product.barcode,
            name: product.name,
            prices_by_store,
            price_stats,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    pub q: Option<String>,
    pub city: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CityQuery {
    pub city: Option<String>,
}

/// GET /api/v1/products/search
pub(super) async fn search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<ProductItem>>>, ApiError> {
    let limit = normalize_limit(query.limit, state.search_limits);

    let products = pricecmp_core::search_products(
        state.prices.as_ref(),
        &state.city_aliases,
        query.q.as_deref().unwrap_or_default(),
        query.city.as_deref().unwrap_or_default(),
        limit,
    )
    .await
    .map_err(|e| map_service_error(req_id.0.clone(), e))?;

    Ok(Json(ApiResponse {
        data: products.into_iter().map(ProductItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/products/{barcode}
pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(barcode): Path<String>,
    Query(query): Query<CityQuery>,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    let product = pricecmp_core::product_by_barcode(
        state.prices.as_ref(),
        &state.city_aliases,
        &barcode,
        query.city.as_deref().unwrap_or_default(),
    )
    .await
    .map_err(|e| map_service_error(req_id.0.clone(), e))?
    .ok_or_else(|| {
        ApiError::new(
            req_id.0.clone(),
            "not_found",
            format!("product '{barcode}' not found"),
        )
    })?;

    Ok(Json(ApiResponse {
        data: ProductItem::from(product),
        meta: ResponseMeta::new(req_id.0),
    }))
}

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Duration, Utc};
use pricecmp_db::{CatalogStatistics, RecentPriceRow, RecentUpdates};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

const RECENT_DEFAULT_HOURS: i64 = 24;
/// Thirty days.
const RECENT_MAX_HOURS: i64 = 720;

#[derive(Debug, Serialize)]
pub(super) struct StatisticsResponse {
    prices: PriceSummary,
    products_by_chain: Vec<ChainCount>,
    top_cities: Vec<CityCount>,
    saved_carts: SavedCartCounts,
}

#[derive(Debug, Serialize)]
pub(super) struct PriceSummary {
    total: i64,
    #[serde(with = "rust_decimal::serde::float_option")]
    average: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    min: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    max: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub(super) struct ChainCount {
    chain: String,
    products: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct CityCount {
    city: String,
    branches: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct SavedCartCounts {
    total: i64,
    owners: i64,
}

impl From<CatalogStatistics> for StatisticsResponse {
    fn from(stats: CatalogStatistics) -> Self {
        Self {
            prices: PriceSummary {
                total: stats.prices.total,
                average: stats.prices.average,
                min: stats.prices.min,
                max: stats.prices.max,
            },
            products_by_chain: stats
                .products_by_chain
                .into_iter()
                .map(|c| ChainCount {
                    chain: c.chain,
                    products: c.products,
                })
                .collect(),
            top_cities: stats
                .top_cities
                .into_iter()
                .map(|c| CityCount {
                    city: c.city,
                    branches: c.branches,
                })
                .collect(),
            saved_carts: SavedCartCounts {
                total: stats.saved_carts,
                owners: stats.cart_owners,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct RecentQuery {
    pub hours: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct RecentUpdatesResponse {
    hours: i64,
    since: DateTime<Utc>,
    total: i64,
    samples: Vec<RecentPriceItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct RecentPriceItem {
    product: String,
    barcode: String,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    chain: String,
    store_id: String,
    city: String,
    last_updated: DateTime<Utc>,
}

impl From<RecentPriceRow> for RecentPriceItem {
    fn from(row: RecentPriceRow) -> Self {
        Self {
            product: row.product,
            barcode: row.barcode,
            price: row.price,
            chain: row.chain,
            store_id: row.store_id,
            city: row.city,
            last_updated: row.last_updated,
        }
    }
}

/// Clamps the look-back window into `1..=RECENT_MAX_HOURS`.
pub(super) fn normalize_hours(hours: Option<i64>) -> i64 {
    hours
        .unwrap_or(RECENT_DEFAULT_HOURS)
        .clamp(1, RECENT_MAX_HOURS)
}

/// GET /api/v1/statistics
pub(super) async fn statistics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<StatisticsResponse>>, ApiError> {
    let stats = pricecmp_db::catalog_statistics(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: StatisticsResponse::from(stats),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/recent-updates
pub(super) async fn recent_updates(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<ApiResponse<RecentUpdatesResponse>>, ApiError> {
    let hours = normalize_hours(query.hours);
    let since = Utc::now() - Duration::hours(hours);

    let RecentUpdates {
        since,
        total,
        samples,
    } = pricecmp_db::recent_price_updates(&state.pool, since)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: RecentUpdatesResponse {
            hours,
            since,
            total,
            samples: samples.into_iter().map(RecentPriceItem::from).collect(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

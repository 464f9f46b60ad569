//! Listings of cities, chains, branches and product-name suggestions.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use pricecmp_core::normalize_city;
use pricecmp_db::{BranchRow, ChainRow};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

const AUTOCOMPLETE_MIN_CHARS: usize = 2;
const AUTOCOMPLETE_DEFAULT_LIMIT: i64 = 10;
const AUTOCOMPLETE_MAX_LIMIT: i64 = 50;

#[derive(Debug, Serialize)]
pub(super) struct ChainItem {
    id: i64,
    name: String,
    display_name: Option<String>,
}

impl From<ChainRow> for ChainItem {
    fn from(row: ChainRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            display_name: row.display_name,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct BranchItem {
    id: i64,
    store_id: String,
    name: Option<String>,
    address: Option<String>,
    city: String,
    chain_id: i64,
    chain: String,
    chain_display_name: Option<String>,
}

impl From<BranchRow> for BranchItem {
    fn from(row: BranchRow) -> Self {
        Self {
            id: row.id,
            store_id: row.store_id,
            name: row.name,
            address: row.address,
            city: row.city,
            chain_id: row.chain_id,
            chain: row.chain,
            chain_display_name: row.chain_display_name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct BranchQuery {
    pub chain_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AutocompleteQuery {
    #[serde(alias = "query")]
    pub q: Option<String>,
    pub limit: Option<i64>,
}

/// GET /api/v1/cities
pub(super) async fn cities(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let cities = pricecmp_db::list_cities(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: cities,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/chains
pub(super) async fn chains(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<ChainItem>>>, ApiError> {
    let rows = pricecmp_db::list_chains(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ChainItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/branches/{city}
///
/// The city goes through the same alias table as search, so `haifa` and
/// `חיפה` list the same branches.
pub(super) async fn branches(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(city): Path<String>,
    Query(query): Query<BranchQuery>,
) -> Result<Json<ApiResponse<Vec<BranchItem>>>, ApiError> {
    let rid = req_id.0;
    let city = normalize_city(&city, &state.city_aliases);
    if city.is_empty() {
        return Err(ApiError::new(rid, "validation_error", "city must not be empty"));
    }

    let rows = pricecmp_db::list_branches(&state.pool, &city, query.chain_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(BranchItem::from).collect(),
        meta: ResponseMeta::new(rid),
    }))
}

/// GET /api/v1/products/autocomplete
pub(super) async fn autocomplete(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<AutocompleteQuery>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let rid = req_id.0;
    let fragment = query.q.as_deref().unwrap_or_default().trim();
    if fragment.chars().count() < AUTOCOMPLETE_MIN_CHARS {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("query must be at least {AUTOCOMPLETE_MIN_CHARS} characters"),
        ));
    }
    let limit = query
        .limit
        .unwrap_or(AUTOCOMPLETE_DEFAULT_LIMIT)
        .clamp(1, AUTOCOMPLETE_MAX_LIMIT);

    let names = pricecmp_db::autocomplete_product_names(&state.pool, fragment, limit)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: names,
        meta: ResponseMeta::new(rid),
    }))
}

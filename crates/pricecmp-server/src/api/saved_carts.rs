//! Saved cart handlers. Every route is scoped to the [`Owner`] bound by the
//! auth middleware.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use pricecmp_core::comparator::prepare_items;
use pricecmp_core::{normalize_city, CartItem};
use pricecmp_db::{SavedCartRow, SavedCartSummary};
use serde::{Deserialize, Serialize};

use crate::middleware::{Owner, RequestId};

use super::cart::{run_comparison, CompareCartResponse};
use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

const MAX_CART_NAME_CHARS: usize = 100;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct SaveCartRequest {
    pub cart_name: String,
    pub city: String,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateItemsRequest {
    pub items: Vec<CartItem>,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct SavedCartItem {
    id: i64,
    cart_name: String,
    city: String,
    items: Vec<CartItem>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SavedCartRow> for SavedCartItem {
    fn from(row: SavedCartRow) -> Self {
        Self {
            id: row.id,
            cart_name: row.cart_name,
            city: row.city,
            items: row.items.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SavedCartListItem {
    id: i64,
    cart_name: String,
    city: String,
    item_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SavedCartSummary> for SavedCartListItem {
    fn from(row: SavedCartSummary) -> Self {
        Self {
            id: row.id,
            cart_name: row.cart_name,
            city: row.city,
            item_count: row.item_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn validate_items(req_id: &str, items: &[CartItem]) -> Result<Vec<CartItem>, ApiError> {
    prepare_items(items).map_err(|e| ApiError::new(req_id, "validation_error", e.to_string()))
}

fn not_found(req_id: &str, id: i64) -> ApiError {
    ApiError::new(req_id, "not_found", format!("saved cart {id} not found"))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/saved-carts: create or replace a cart by name.
pub(super) async fn create(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(owner): Extension<Owner>,
    Json(body): Json<SaveCartRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SavedCartItem>>), ApiError> {
    let rid = &req_id.0;

    let cart_name = body.cart_name.trim();
    if cart_name.is_empty() || cart_name.chars().count() > MAX_CART_NAME_CHARS {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("cart_name must be 1-{MAX_CART_NAME_CHARS} characters"),
        ));
    }
    let city = normalize_city(&body.city, &state.city_aliases);
    if city.is_empty() {
        return Err(ApiError::new(rid, "validation_error", "city must not be empty"));
    }
    let items = validate_items(rid, &body.items)?;

    let row = pricecmp_db::save_cart(&state.pool, &owner.0, cart_name, &city, &items)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(owner = %owner.0, cart_id = row.id, items = items.len(), "saved cart stored");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: SavedCartItem::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /api/v1/saved-carts
pub(super) async fn list(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(owner): Extension<Owner>,
) -> Result<Json<ApiResponse<Vec<SavedCartListItem>>>, ApiError> {
    let rows = pricecmp_db::list_saved_carts(&state.pool, &owner.0)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(SavedCartListItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/saved-carts/{id}
pub(super) async fn get(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(owner): Extension<Owner>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<SavedCartItem>>, ApiError> {
    let rid = &req_id.0;
    let row = pricecmp_db::get_saved_cart(&state.pool, &owner.0, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid, id))?;

    Ok(Json(ApiResponse {
        data: SavedCartItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PUT /api/v1/saved-carts/{id}/items
pub(super) async fn update_items(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(owner): Extension<Owner>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateItemsRequest>,
) -> Result<Json<ApiResponse<SavedCartItem>>, ApiError> {
    let rid = &req_id.0;
    let items = validate_items(rid, &body.items)?;

    let row = pricecmp_db::update_saved_cart_items(&state.pool, &owner.0, id, &items)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid, id))?;

    Ok(Json(ApiResponse {
        data: SavedCartItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/saved-carts/{id}
pub(super) async fn delete(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(owner): Extension<Owner>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let rid = &req_id.0;
    let deleted = pricecmp_db::delete_saved_cart(&state.pool, &owner.0, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !deleted {
        return Err(not_found(rid, id));
    }

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/saved-carts/{id}/compare: re-run the comparison against
/// current prices.
pub(super) async fn compare(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(owner): Extension<Owner>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CompareCartResponse>>, ApiError> {
    let row = pricecmp_db::get_saved_cart(&state.pool, &owner.0, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| not_found(&req_id.0, id))?;

    run_comparison(&state, req_id, &row.city, row.items()).await
}

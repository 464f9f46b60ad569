mod cart;
mod directory;
mod products;
mod saved_carts;
mod stats;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use pricecmp_core::{AppConfig, CityAliases, PriceRepository, ServiceError};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub prices: Arc<dyn PriceRepository>,
    pub city_aliases: Arc<CityAliases>,
    pub search_limits: SearchLimits,
}

/// Default and maximum number of products a search returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub default: usize,
    pub max: usize,
}

impl SearchLimits {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            default: config.search_default_limit,
            max: config.search_max_limit,
        }
    }
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            default: 20,
            max: 100,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Clamps a requested page size into `1..=limits.max`, defaulting when absent.
pub(super) fn normalize_limit(limit: Option<i64>, limits: SearchLimits) -> usize {
    let max = i64::try_from(limits.max).unwrap_or(i64::MAX).max(1);
    let default = i64::try_from(limits.default).unwrap_or(max);
    let clamped = limit.unwrap_or(default).clamp(1, max);
    usize::try_from(clamped).unwrap_or(1)
}

pub(super) fn map_db_error(request_id: String, error: &pricecmp_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_service_error(request_id: String, error: ServiceError) -> ApiError {
    match error {
        ServiceError::Validation(e) => ApiError::new(request_id, "validation_error", e.to_string()),
        ServiceError::Repository(e) => {
            tracing::error!(error = %e, "price lookup failed");
            ApiError::new(request_id, "internal_error", "price lookup failed")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/cities", get(directory::cities))
        .route("/api/v1/chains", get(directory::chains))
        .route("/api/v1/branches/{city}", get(directory::branches))
        .route("/api/v1/products/search", get(products::search))
        .route("/api/v1/products/autocomplete", get(directory::autocomplete))
        .route("/api/v1/products/{barcode}", get(products::get_product))
        .route("/api/v1/cart/compare", post(cart::compare))
        .route(
            "/api/v1/saved-carts",
            get(saved_carts::list).post(saved_carts::create),
        )
        .route(
            "/api/v1/saved-carts/{id}",
            get(saved_carts::get).delete(saved_carts::delete),
        )
        .route("/api/v1/saved-carts/{id}/items", put(saved_carts::update_items))
        .route("/api/v1/saved-carts/{id}/compare", get(saved_carts::compare))
        .route("/api/v1/statistics", get(stats::statistics))
        .route("/api/v1/recent-updates", get(stats::recent_updates))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match pricecmp_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[must_use]
pub fn rate_limit_state_from_config(config: &AppConfig) -> RateLimitState {
    RateLimitState::new(
        config.rate_limit_max_requests,
        Duration::from_secs(config.rate_limit_window_secs),
    )
}

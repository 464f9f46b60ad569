use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

const API_KEYS_VAR: &str = "PRICECMP_API_KEYS";

/// Owner used for every request when auth is disabled in development.
pub const LOCAL_OWNER: &str = "local";

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Identity bound to the presented API key, stored as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub String);

#[derive(Debug, Clone)]
struct ApiKey {
    owner: String,
    token: String,
}

/// API key auth settings used by middleware.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<Vec<ApiKey>>,
    pub enabled: bool,
}

impl AuthState {
    /// Builds auth config from `PRICECMP_API_KEYS`.
    ///
    /// # Errors
    ///
    /// See [`AuthState::from_raw`].
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var(API_KEYS_VAR).unwrap_or_default();
        Self::from_raw(&raw, is_development)
    }

    /// Parses comma-separated `owner:token` pairs.
    ///
    /// In development, empty keys disable auth for local iteration.
    /// In non-development envs, empty keys fail startup.
    ///
    /// # Errors
    ///
    /// Fails on an entry without both an owner and a token, or when no keys
    /// are configured outside development.
    pub fn from_raw(raw: &str, is_development: bool) -> anyhow::Result<Self> {
        let mut keys = Vec::new();
        for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let Some((owner, token)) = entry.split_once(':') else {
                anyhow::bail!("{API_KEYS_VAR} entries must look like owner:token");
            };
            let (owner, token) = (owner.trim(), token.trim());
            if owner.is_empty() || token.is_empty() {
                anyhow::bail!("{API_KEYS_VAR} entries need a non-empty owner and token");
            }
            keys.push(ApiKey {
                owner: owner.to_owned(),
                token: token.to_owned(),
            });
        }

        if keys.is_empty() {
            if is_development {
                tracing::warn!(
                    "{API_KEYS_VAR} not set; bearer auth disabled in development environment"
                );
                return Ok(Self {
                    api_keys: Arc::new(Vec::new()),
                    enabled: false,
                });
            }

            anyhow::bail!(
                "{API_KEYS_VAR} is required outside development; provide comma-separated owner:token pairs"
            );
        }

        Ok(Self {
            api_keys: Arc::new(keys),
            enabled: true,
        })
    }

    /// Owner bound to `token`. Every configured key is compared in constant time.
    fn owner_for(&self, token: &str) -> Option<&str> {
        let mut found = None;
        for key in self.api_keys.iter() {
            if bool::from(key.token.as_bytes().ct_eq(token.as_bytes())) {
                found = Some(key.owner.as_str());
            }
        }
        found
    }
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter shared by every protected route.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

impl IntoResponse for MiddlewareErrorBody {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self)).into_response()
    }
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing Bearer token auth when enabled.
///
/// On success the key's owner is inserted as an [`Owner`] extension; with
/// auth disabled every request acts as [`LOCAL_OWNER`].
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        req.extensions_mut().insert(Owner(LOCAL_OWNER.to_owned()));
        return next.run(req).await;
    }

    let owner = extract_bearer_token(req.headers().get(AUTHORIZATION))
        .and_then(|token| auth.owner_for(token))
        .map(ToOwned::to_owned);

    match owner {
        Some(owner) => {
            req.extensions_mut().insert(Owner(owner));
            next.run(req).await
        }
        None => MiddlewareErrorBody {
            error: MiddlewareError {
                code: "unauthorized",
                message: "missing or invalid bearer token",
            },
        }
        .into_response(),
    }
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;
    let elapsed = window.started_at.elapsed();

    if elapsed >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(MiddlewareErrorBody {
                error: MiddlewareError {
                    code: "rate_limited",
                    message: "rate limit exceeded",
                },
            }),
        )
            .into_response();
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
    }

    #[test]
    fn auth_state_disables_when_no_keys_in_dev() {
        let state = AuthState::from_raw("", true).expect("dev should allow missing keys");
        assert!(!state.enabled);
    }

    #[test]
    fn auth_state_requires_keys_outside_dev() {
        assert!(AuthState::from_raw("  ", false).is_err());
    }

    #[test]
    fn auth_state_rejects_entries_without_owner() {
        assert!(AuthState::from_raw("just-a-token", true).is_err());
        assert!(AuthState::from_raw(":token", true).is_err());
        assert!(AuthState::from_raw("alice:", true).is_err());
    }

    #[test]
    fn owner_for_maps_tokens_to_owners() {
        let state = AuthState::from_raw("alice:tok-a, bob:tok-b", false).expect("keys");
        assert!(state.enabled);
        assert_eq!(state.owner_for("tok-a"), Some("alice"));
        assert_eq!(state.owner_for("tok-b"), Some("bob"));
        assert_eq!(state.owner_for("tok-c"), None);
        assert_eq!(state.owner_for("tok-"), None);
    }
}

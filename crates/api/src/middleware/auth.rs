//! Authentication middleware.
//!
//! Back-office routes require the `X-API-Key` header. The key itself is never
//! stored; configuration holds its SHA-256 digest.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::crypto::{constant_time_eq, sha256_hex};

use crate::app::AppState;
use crate::error::ApiError;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Checks a presented key against the configured digest.
///
/// An empty digest means no admin key is configured and every key is rejected.
pub fn admin_key_matches(presented: &str, expected_hash: &str) -> bool {
    if expected_hash.is_empty() || presented.is_empty() {
        return false;
    }
    constant_time_eq(&sha256_hex(presented), &expected_hash.to_ascii_lowercase())
}

/// Middleware for admin-only routes.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let api_key = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if api_key.is_empty() {
        return ApiError::Unauthorized("Invalid or missing API key".into()).into_response();
    }

    if !admin_key_matches(api_key, &state.config.security.admin_api_key_hash) {
        tracing::warn!(path = %req.uri().path(), "Rejected admin request with invalid API key");
        return ApiError::Unauthorized("Invalid or missing API key".into()).into_response();
    }

    next.run(req).await
}

//! Rate limiting middleware.
//!
//! Public form endpoints (registration, subscribe, survey responses, checkout)
//! are limited per client IP address.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter as GovRateLimiter,
};
use serde_json::json;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    num::NonZeroU32,
};

use crate::app::AppState;

type IpRateLimiter = GovRateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

/// Rate limiter state shared across all requests.
pub struct RateLimiterState {
    limiter: IpRateLimiter,
    rate_limit_per_minute: u32,
}

impl RateLimiterState {
    /// Create a limiter allowing `rate_limit_per_minute` requests per client.
    ///
    /// Returns None for a zero limit, which disables limiting.
    pub fn new(rate_limit_per_minute: u32) -> Option<Self> {
        let per_minute = NonZeroU32::new(rate_limit_per_minute)?;
        Some(Self {
            limiter: GovRateLimiter::keyed(Quota::per_minute(per_minute)),
            rate_limit_per_minute,
        })
    }

    /// Returns Err with the retry-after delay in seconds when the client is over its quota.
    pub fn check(&self, client: IpAddr) -> Result<(), u64> {
        match self.limiter.check_key(&client) {
            Ok(_) => Ok(()),
            Err(not_until) => {
                let wait_time = not_until.wait_time_from(DefaultClock::default().now());
                Err(wait_time.as_secs().max(1))
            }
        }
    }

    /// Drop limiter entries for clients that are back to a full quota.
    pub fn prune(&self) {
        self.limiter.retain_recent();
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }

    pub fn rate_limit_per_minute(&self) -> u32 {
        self.rate_limit_per_minute
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("tracked_clients", &self.tracked_clients())
            .finish()
    }
}

/// Client address: first `X-Forwarded-For` hop, then the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> IpAddr {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse::<IpAddr>().ok())
        .or_else(|| peer.map(|addr| addr.ip()))
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Middleware that applies rate limiting per client IP.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(rate_limiter) = state.rate_limiter.as_ref() else {
        return next.run(req).await;
    };

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_ip(req.headers(), peer);

    if let Err(retry_after) = rate_limiter.check(client) {
        tracing::warn!(client = %client, path = %req.uri().path(), "Rate limit exceeded");
        metrics::counter!("rate_limited_requests_total").increment(1);
        return rate_limited_response(rate_limiter.rate_limit_per_minute(), retry_after);
    }

    next.run(req).await
}

/// Create a rate limited response with proper headers and body.
fn rate_limited_response(limit: u32, retry_after: u64) -> Response {
    let body = json!({
        "error": format!("Rate limit of {} requests/minute exceeded", limit),
        "code": "rate_limited",
        "retryAfter": retry_after
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();

    if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
        response.headers_mut().insert(header::RETRY_AFTER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_zero_limit_disables_limiter() {
        assert!(RateLimiterState::new(0).is_none());
        assert!(RateLimiterState::new(5).is_some());
    }

    #[test]
    fn test_rate_limiter_exhaustion() {
        let state = RateLimiterState::new(3).unwrap();
        for _ in 0..3 {
            assert!(state.check(ip(1)).is_ok());
        }
        let retry_after = state.check(ip(1)).unwrap_err();
        assert!(retry_after >= 1);
    }

    #[test]
    fn test_clients_are_limited_independently() {
        let state = RateLimiterState::new(1).unwrap();
        assert!(state.check(ip(1)).is_ok());
        assert!(state.check(ip(1)).is_err());
        assert!(state.check(ip(2)).is_ok());
        assert_eq!(state.tracked_clients(), 2);
    }

    #[test]
    fn test_client_ip_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        let peer: SocketAddr = "192.0.2.1:4000".parse().unwrap();
        assert_eq!(
            client_ip(&headers, Some(peer)),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_client_ip_falls_back_to_peer() {
        let headers = HeaderMap::new();
        let peer: SocketAddr = "192.0.2.1:4000".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer)), peer.ip());
        assert_eq!(
            client_ip(&headers, None),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );
    }

    #[test]
    fn test_rate_limited_response_headers() {
        let response = rate_limited_response(10, 42);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");
    }
}

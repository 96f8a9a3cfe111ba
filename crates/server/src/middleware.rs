//! Axum middleware adapters.
//!
//! HTTP-specific wrappers around the business-logic components in
//! `fastbreak_core::middleware`: status codes and request plumbing here,
//! window bookkeeping there.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use fastbreak_core::middleware::ClientRateLimiter;
use std::{net::SocketAddr, sync::Arc};

/// Enforces the per-IP request budget.
///
/// # Errors
///
/// Returns `StatusCode::TOO_MANY_REQUESTS` when the client's window is
/// over budget.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(rate_limiter): State<Arc<ClientRateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let key = addr.ip().to_string();

    if !rate_limiter.check_rate_limit(&key) {
        tracing::warn!(client = %key, "rate limit exceeded");
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    Ok(next.run(request).await)
}

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use tokio::time::Instant;

use crate::error::AppError;
use crate::state::{AppState, RateLimitBucket};

/// Code lookups allowed per client per window.
const RATE_LIMIT: u32 = 30;
const BURST: u32 = 10;
const CAPACITY: u32 = RATE_LIMIT + BURST;
const WINDOW_SECS: u64 = 60;

/// Identify the client by its peer address. Forwarding headers (first
/// `X-Forwarded-For` hop, then `X-Real-IP`) are only honoured when the
/// server sits behind a trusted proxy.
fn client_key(req: &Request, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        let headers = req.headers();
        let forwarded = headers
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        let real_ip = headers
            .get("X-Real-IP")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        if let Some(ip) = forwarded.or(real_ip) {
            return format!("ip:{ip}");
        }
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| format!("ip:{}", addr.ip()))
        .unwrap_or_else(|| "anon".to_string())
}

/// Drop buckets untouched for a full window. Such a bucket would be back
/// at capacity anyway.
fn evict_stale(buckets: &DashMap<String, RateLimitBucket>, now: Instant) {
    buckets.retain(|_, bucket| now.duration_since(bucket.last_refill).as_secs() < WINDOW_SECS);
}

/// Take one token from `bucket`, refilling in proportion to elapsed time.
/// Returns the seconds to wait when the bucket is empty.
fn take_token(bucket: &mut RateLimitBucket, now: Instant) -> Result<u32, u64> {
    let elapsed = now.duration_since(bucket.last_refill).as_secs();
    if elapsed >= WINDOW_SECS {
        bucket.remaining = CAPACITY;
        bucket.last_refill = now;
    } else if elapsed > 0 {
        let refill = (elapsed * CAPACITY as u64 / WINDOW_SECS) as u32;
        if refill > 0 {
            bucket.remaining = (bucket.remaining + refill).min(CAPACITY);
            bucket.last_refill = now;
        }
    }

    if bucket.remaining == 0 {
        let wait = WINDOW_SECS.saturating_sub(now.duration_since(bucket.last_refill).as_secs());
        return Err(wait.max(1));
    }
    bucket.remaining -= 1;
    Ok(bucket.remaining)
}

/// Token-bucket throttle for the RSVP routes, where every request is a
/// guess at an invitation code.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let key = client_key(&req, state.trust_proxy_headers);
    let now = Instant::now();

    if !state.rate_limits.contains_key(&key) {
        evict_stale(&state.rate_limits, now);
    }

    let taken = {
        let mut entry = state
            .rate_limits
            .entry(key.clone())
            .or_insert_with(|| RateLimitBucket {
                remaining: CAPACITY,
                last_refill: now,
            });
        take_token(entry.value_mut(), now)
    };

    let remaining = match taken {
        Ok(remaining) => remaining,
        Err(retry_after) => {
            tracing::warn!(client = %key, "throttling RSVP requests");
            return AppError::RateLimited { retry_after }.into_response();
        }
    };

    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", CAPACITY.into());
    headers.insert("X-RateLimit-Remaining", remaining.into());
    response
}

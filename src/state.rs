use dashmap::DashMap;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::time::Instant;

use crate::legacy::LegacyConnector;
use crate::mailer::Mailer;
use crate::models::invitation::ExpiryPolicy;

/// Per-client token bucket for throttling code lookups.
#[derive(Clone)]
pub struct RateLimitBucket {
    pub remaining: u32,
    pub last_refill: Instant,
}

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub legacy: Arc<dyn LegacyConnector>,
    pub mailer: Arc<dyn Mailer>,
    pub public_url: String,
    pub mail_from: String,
    pub expiry: ExpiryPolicy,
    pub trust_proxy_headers: bool,
    pub rate_limits: Arc<DashMap<String, RateLimitBucket>>,
}

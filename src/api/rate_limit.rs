// src/api/rate_limit.rs
//! Per-gateway request throttling.
//!
//! One token bucket per distinct gateway URL. The registry is built from
//! configuration before any request is made and shared by reference, so
//! document types pointing at the same URL draw from the same bucket.

use crate::config::{Endpoint, GatewayConfig};
use crate::constants::{GATEWAY_RATE_WINDOW, GATEWAY_REQUESTS_PER_SECOND};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Token bucket allowing `limit` requests per `window`, bursting up to
/// `limit`.
///
/// Callers reserve a token under the lock and sleep outside it, so the
/// bucket may run negative; waiters are served in arrival order.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: f64,
    tokens_per_sec: f64,
    bucket: Mutex<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        let capacity = f64::from(limit.max(1));
        Self {
            capacity,
            tokens_per_sec: capacity / window.as_secs_f64().max(f64::EPSILON),
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                refilled_at: Instant::now(),
            }),
        }
    }

    /// Waits until a request may be sent.
    pub async fn acquire(&self) {
        if let Some(wait) = self.reserve() {
            tokio::time::sleep(wait).await;
        }
    }

    /// Takes a token, returning how long to wait for it to be valid.
    fn reserve(&self) -> Option<Duration> {
        let mut bucket = self.bucket.lock();
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.refilled_at).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.tokens_per_sec).min(self.capacity);
        bucket.refilled_at = now;

        bucket.tokens -= 1.0;
        if bucket.tokens >= 0.0 {
            None
        } else {
            Some(Duration::from_secs_f64(-bucket.tokens / self.tokens_per_sec))
        }
    }
}

/// One limiter per distinct gateway URL.
#[derive(Debug, Default)]
pub struct LimiterRegistry {
    limiters: HashMap<String, Arc<RateLimiter>>,
}

impl LimiterRegistry {
    /// Builds limiters for every endpoint at the standard ceiling.
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::with_limit(config, GATEWAY_REQUESTS_PER_SECOND, GATEWAY_RATE_WINDOW)
    }

    pub fn with_limit(config: &GatewayConfig, limit: u32, window: Duration) -> Self {
        let mut limiters = HashMap::new();
        for (_, endpoint) in config.endpoints() {
            limiters
                .entry(endpoint.limiter_key().to_string())
                .or_insert_with(|| {
                    log::info!(
                        "Creating rate limiter for gateway {} ({} req per {:?})",
                        endpoint.base_url,
                        limit,
                        window
                    );
                    Arc::new(RateLimiter::new(limit, window))
                });
        }
        Self { limiters }
    }

    pub fn limiter_for(&self, endpoint: &Endpoint) -> Option<Arc<RateLimiter>> {
        self.limiters.get(endpoint.limiter_key()).cloned()
    }

    pub fn covers(&self, config: &GatewayConfig) -> bool {
        config
            .endpoints()
            .all(|(_, e)| self.limiters.contains_key(e.limiter_key()))
    }

    pub fn len(&self) -> usize {
        self.limiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limiters.is_empty()
    }
}

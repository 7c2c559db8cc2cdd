//! Per-client token bucket in front of the query endpoints.

use bridge_traits::time::Clock;
use core_runtime::config::RateLimitConfig;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: f64,
    last_refill_ms: i64,
}

struct Buckets {
    by_client: HashMap<String, Bucket>,
    last_sweep_ms: i64,
}

/// Each client gets `requests_per_window` tokens, refilled continuously
/// over `window`. Buckets idle for `idle_eviction` are dropped.
pub struct RateLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    buckets: Mutex<Buckets>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        let now = clock.unix_timestamp_millis();
        Self {
            config,
            clock,
            buckets: Mutex::new(Buckets {
                by_client: HashMap::new(),
                last_sweep_ms: now,
            }),
        }
    }

    fn capacity(&self) -> f64 {
        f64::from(self.config.requests_per_window)
    }

    /// Tokens regained per millisecond.
    fn refill_rate(&self) -> f64 {
        self.capacity() / (self.config.window.as_millis().max(1) as f64)
    }

    /// Takes one token for `client`.
    ///
    /// Returns `Err(retry_after)` when the bucket is empty.
    pub fn check(&self, client: &str) -> Result<(), Duration> {
        let now = self.clock.unix_timestamp_millis();
        let capacity = self.capacity();
        let rate = self.refill_rate();

        let mut buckets = self.buckets.lock();
        self.sweep(&mut buckets, now);

        let bucket = buckets
            .by_client
            .entry(client.to_string())
            .or_insert(Bucket {
                tokens: capacity,
                last_refill_ms: now,
            });

        let elapsed = (now - bucket.last_refill_ms).max(0) as f64;
        bucket.tokens = (bucket.tokens + elapsed * rate).min(capacity);
        bucket.last_refill_ms = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else {
            let wait_ms = ((1.0 - bucket.tokens) / rate).ceil() as u64;
            debug!(client, wait_ms, "Rate limit exceeded");
            Err(Duration::from_millis(wait_ms.max(1)))
        }
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().by_client.len()
    }

    fn sweep(&self, buckets: &mut Buckets, now: i64) {
        let idle_ms = self.config.idle_eviction.as_millis() as i64;
        if now - buckets.last_sweep_ms < idle_ms {
            return;
        }

        let before = buckets.by_client.len();
        buckets
            .by_client
            .retain(|_, bucket| now - bucket.last_refill_ms < idle_ms);
        buckets.last_sweep_ms = now;

        let evicted = before - buckets.by_client.len();
        if evicted > 0 {
            debug!(evicted, "Evicted idle rate limit buckets");
        }
    }
}

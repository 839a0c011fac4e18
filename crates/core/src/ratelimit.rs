// Fixed-window rate limiting keyed by client.
//
// Each key owns one bucket for at most one window at a time. The
// check-and-increment runs under the bucket's own lock, so two
// simultaneous requests from one key cannot both claim the last slot.
// The outer map lock is held only long enough to find the bucket.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const DEFAULT_WINDOW_SECS: u64 = 60;
pub const DEFAULT_MAX_CALLS: u32 = 100;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }

    /// Retry hint in whole seconds, rounded up and never zero.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            RateDecision::Allowed { .. } => None,
            RateDecision::Limited { retry_after } => {
                Some((retry_after.as_secs_f64().ceil() as u64).max(1))
            }
        }
    }
}

struct Bucket {
    window_start: Instant,
    count: u32,
}

/// Per-client-key fixed-window call counter.
pub struct RateLimiter {
    window: Duration,
    max_calls: u32,
    buckets: Mutex<HashMap<String, Arc<Mutex<Bucket>>>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_calls: u32) -> Self {
        Self {
            window,
            max_calls,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn max_calls(&self) -> u32 {
        self.max_calls
    }

    /// Count this call against `client_key` and decide whether it may
    /// proceed. Denied calls are counted too; the next window reset
    /// clears them.
    pub fn check(&self, client_key: &str) -> RateDecision {
        self.check_at(client_key, Instant::now())
    }

    fn check_at(&self, client_key: &str, now: Instant) -> RateDecision {
        let bucket = {
            let mut buckets = self.buckets.lock().unwrap();
            buckets
                .entry(client_key.to_string())
                .or_insert_with(|| {
                    Arc::new(Mutex::new(Bucket {
                        window_start: now,
                        count: 0,
                    }))
                })
                .clone()
        };

        let mut bucket = bucket.lock().unwrap();

        let elapsed = now.saturating_duration_since(bucket.window_start);
        if elapsed >= self.window {
            bucket.window_start = now;
            bucket.count = 0;
        }

        bucket.count += 1;
        if bucket.count <= self.max_calls {
            RateDecision::Allowed {
                remaining: self.max_calls - bucket.count,
            }
        } else {
            let retry_after = self.window - now.saturating_duration_since(bucket.window_start);
            tracing::warn!(
                client_key = %client_key,
                max_calls = self.max_calls,
                "rate limit exceeded"
            );
            RateDecision::Limited { retry_after }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_WINDOW_SECS), DEFAULT_MAX_CALLS)
    }
}

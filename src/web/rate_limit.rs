//! Fixed-window rate limiting keyed by operation label and client.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Above this many buckets, expired ones are dropped on the next check.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    start: Instant,
    count: u64,
}

/// In-memory fixed-window counters, one per `<label>:<client>` key.
///
/// A bucket restarts once more than `window` has elapsed since it opened.
/// Every request counts, including rejected ones.
pub struct FixedWindowLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
    window: Duration,
}

impl FixedWindowLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            window,
        }
    }

    /// Count one request for `client` under `label`. Returns `true` if it is
    /// within `max` for the current window.
    pub fn check(&self, label: &str, client: &str, max: u64) -> bool {
        self.check_at(label, client, max, Instant::now())
    }

    pub(crate) fn check_at(&self, label: &str, client: &str, max: u64, now: Instant) -> bool {
        // On lock poisoning, keep counting with the inner map rather than
        // failing requests.
        let mut buckets = match self.buckets.lock() {
            Ok(b) => b,
            Err(e) => e.into_inner(),
        };

        if buckets.len() > PRUNE_THRESHOLD {
            let window = self.window;
            buckets.retain(|_, b| now.saturating_duration_since(b.start) <= window);
        }

        let bucket = buckets
            .entry(format!("{label}:{client}"))
            .or_insert(Bucket {
                start: now,
                count: 0,
            });
        if now.saturating_duration_since(bucket.start) > self.window {
            *bucket = Bucket {
                start: now,
                count: 0,
            };
        }
        bucket.count += 1;

        let allowed = bucket.count <= max;
        if !allowed {
            tracing::debug!(label, client, count = bucket.count, "Rate limit exceeded");
        }
        allowed
    }
}

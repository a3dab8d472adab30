use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::debug;

/// Buckets are swept no more often than this, whatever the window is.
const MIN_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Outcome of counting one request against a client's window.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    /// Whether the request fits in the current window.
    pub allowed: bool,
    /// Configured request budget per window.
    pub limit: u64,
    /// Requests left in the current window.
    pub remaining: u64,
    /// Time until the current window resets.
    pub reset_after: Duration,
}

impl RateLimitDecision {
    /// Whole seconds until the window resets, rounded up. Doubles as the
    /// Retry-After value on rejection.
    pub fn reset_secs(&self) -> u64 {
        self.reset_after.as_millis().div_ceil(1000) as u64
    }
}

/// A fixed window rate limiter with one counting bucket per client key.
///
/// Every request is counted, so the informational headers can always be
/// attached; only the threshold comparison decides between allow and reject.
/// Buckets whose window has been stale for longer than one full window are
/// dropped by [`evict_stale`](Self::evict_stale), keeping memory bounded to
/// active clients.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<String, Bucket>>>,
    max_requests: u64,
    window: Duration,
}

#[derive(Debug)]
struct Bucket {
    window_start: Instant,
    count: u64,
}

impl RateLimiter {
    /// Create a new [`RateLimiter`] allowing `max_requests` per `window`.
    pub fn new(max_requests: u64, window: Duration) -> Self {
        Self { buckets: Arc::new(Mutex::new(HashMap::new())), max_requests, window }
    }

    /// Count a request from `key` against its current window.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let mut buckets = self.buckets.lock().expect("lock poisoned");
        let bucket = buckets
            .entry(key.to_owned())
            .or_insert(Bucket { window_start: now, count: 0 });

        if now.duration_since(bucket.window_start) >= self.window {
            bucket.window_start = now;
            bucket.count = 0;
        }
        bucket.count += 1;

        RateLimitDecision {
            allowed: bucket.count <= self.max_requests,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(bucket.count),
            reset_after: self.window.saturating_sub(now.duration_since(bucket.window_start)),
        }
    }

    /// Drop every bucket whose window has been stale for longer than one
    /// window. Returns the number of evicted buckets.
    pub fn evict_stale(&self) -> usize {
        self.evict_stale_at(Instant::now())
    }

    fn evict_stale_at(&self, now: Instant) -> usize {
        let mut buckets = self.buckets.lock().expect("lock poisoned");
        let before = buckets.len();
        buckets.retain(|_, bucket| now.duration_since(bucket.window_start) <= self.window);
        before - buckets.len()
    }

    /// How often the sweeper runs: the window itself, but never more often
    /// than once a minute.
    pub fn cleanup_interval(&self) -> Duration {
        self.window.max(MIN_CLEANUP_INTERVAL)
    }

    /// Number of live buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.lock().expect("lock poisoned").len()
    }

    /// Spawn the detached background sweep. The task never blocks request
    /// handling and does not keep the process alive on shutdown.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let limiter = self.clone();
        let period = self.cleanup_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = limiter.evict_stale();
                if evicted > 0 {
                    debug!(evicted, "evicted stale rate limit buckets");
                }
            }
        })
    }
}

use std::{
    collections::HashMap,
    fmt,
    hash::Hash,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use tracing::debug;

/// Source of store-side random samples, keyed by the field a pool tracks.
///
/// Implementations are expected to be expensive per call (full-scan class
/// queries); the pool exists to amortize them.
#[async_trait]
pub trait Sampler<K>: Send + Sync + 'static {
    /// Record type held by the pools.
    type Item: Send + 'static;

    /// Return up to `size` records whose `key` field is present, in
    /// arbitrary (already randomized) order.
    async fn sample(&self, key: K, size: usize) -> eyre::Result<Vec<Self::Item>>;
}

/// Error delivered to every caller that joined a failed refill.
#[derive(Clone, Debug)]
pub struct RefillError(Arc<eyre::Report>);

impl fmt::Display for RefillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for RefillError {}

type SharedRefill = Shared<BoxFuture<'static, Result<(), RefillError>>>;

struct PoolState<T> {
    items: Vec<T>,
    refill: Option<SharedRefill>,
}

impl<T> Default for PoolState<T> {
    fn default() -> Self {
        Self { items: Vec::new(), refill: None }
    }
}

/// In-memory pools of pre-sampled records, one per key, refilled on demand
/// with single-flight semantics.
///
/// Serving a record is a plain pop. Only a caller that finds its pool empty
/// touches the sampler, and concurrent callers in that situation share one
/// in-flight refill instead of each issuing a redundant query. Pools are
/// created lazily on first access and live for the process lifetime.
pub struct SamplePool<K, S: Sampler<K>> {
    sampler: Arc<S>,
    capacity: usize,
    pools: Mutex<HashMap<K, Arc<Mutex<PoolState<S::Item>>>>>,
}

impl<K, S: Sampler<K>> fmt::Debug for SamplePool<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamplePool").field("capacity", &self.capacity).finish_non_exhaustive()
    }
}

impl<K, S> SamplePool<K, S>
where
    K: Copy + Eq + Hash + fmt::Display + Send + 'static,
    S: Sampler<K>,
{
    /// Create a pool set drawing `capacity` records per refill (floor 1).
    pub fn new(sampler: S, capacity: usize) -> Self {
        Self {
            sampler: Arc::new(sampler),
            capacity: capacity.max(1),
            pools: Mutex::new(HashMap::new()),
        }
    }

    /// Records fetched per refill.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    fn pool(&self, key: K) -> Arc<Mutex<PoolState<S::Item>>> {
        let mut pools = self.pools.lock().expect("lock poisoned");
        Arc::clone(pools.entry(key).or_default())
    }

    /// Pop one pre-sampled record for `key`, refilling through the sampler
    /// when the buffer is empty.
    ///
    /// `Ok(None)` means the refill yielded nothing for this caller — either
    /// the store has no matching records or concurrent joiners drained the
    /// batch first. Nothing is cached in that case; the next call starts a
    /// fresh refill. A sampler failure reaches every caller that joined the
    /// same refill, and the in-flight slot is cleared before they resume, so
    /// a later call can retry independently.
    pub async fn fetch_random(&self, key: K) -> Result<Option<S::Item>, RefillError> {
        let pool = self.pool(key);
        let refill = {
            let mut state = pool.lock().expect("lock poisoned");
            if let Some(item) = state.items.pop() {
                return Ok(Some(item));
            }
            match &state.refill {
                Some(inflight) => inflight.clone(),
                None => {
                    let started = Self::start_refill(
                        Arc::clone(&self.sampler),
                        Arc::clone(&pool),
                        key,
                        self.capacity,
                    );
                    state.refill = Some(started.clone());
                    started
                }
            }
        };

        refill.await?;

        let mut state = pool.lock().expect("lock poisoned");
        Ok(state.items.pop())
    }

    // The in-flight slot is cleared inside the future itself, under the pool
    // lock, before any waiter resumes. Waiters drive the shared future; it
    // is not spawned.
    fn start_refill(
        sampler: Arc<S>,
        pool: Arc<Mutex<PoolState<S::Item>>>,
        key: K,
        capacity: usize,
    ) -> SharedRefill {
        async move {
            let sampled = sampler.sample(key, capacity).await;
            let mut state = pool.lock().expect("lock poisoned");
            state.refill = None;
            match sampled {
                Ok(items) => {
                    debug!(field = %key, fetched = items.len(), "sample pool refilled");
                    state.items = items;
                    Ok(())
                }
                Err(e) => Err(RefillError(Arc::new(e))),
            }
        }
        .boxed()
        .shared()
    }
}

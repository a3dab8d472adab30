//! Shared state for API handlers and constants

use std::sync::Arc;

use async_trait::async_trait;
use clickhouse_lib::{ClickhouseReader, PhotoField, PhotoRow};
use runtime::sample_pool::{SamplePool, Sampler};

/// Default number of photos fetched per pool refill.
pub const DEFAULT_POOL_CAPACITY: usize = 25;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub(crate) client: ClickhouseReader,
    pub(crate) pool: Arc<SamplePool<PhotoField, PhotoSampler>>,
}

impl std::fmt::Debug for ApiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiState").finish_non_exhaustive()
    }
}

impl ApiState {
    /// Create a new [`ApiState`] whose pools draw `pool_capacity` photos per
    /// refill.
    pub fn new(client: ClickhouseReader, pool_capacity: usize) -> Self {
        let pool = Arc::new(SamplePool::new(PhotoSampler(client.clone()), pool_capacity));
        Self { client, pool }
    }
}

/// Adapter giving the sample pools access to store-side random sampling.
#[derive(Clone, Debug)]
pub struct PhotoSampler(ClickhouseReader);

#[async_trait]
impl Sampler<PhotoField> for PhotoSampler {
    type Item = PhotoRow;

    async fn sample(&self, key: PhotoField, size: usize) -> eyre::Result<Vec<PhotoRow>> {
        self.0.sample_photos(key, size).await
    }
}

//! Photoscope configuration
use std::{path::PathBuf, time::Duration};

use clap::Parser;
use url::Url;

/// Origins allowed to call the API from a browser during development.
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

/// Clickhouse database configuration options
#[derive(Debug, Clone, Parser)]
pub struct ClickhouseOpts {
    /// Clickhouse URL
    #[clap(long, env = "CLICKHOUSE_URL")]
    pub url: Url,
    /// Clickhouse database
    #[clap(long, env = "CLICKHOUSE_DB")]
    pub db: String,
    /// Clickhouse username
    #[clap(long, env = "CLICKHOUSE_USERNAME")]
    pub username: String,
    /// Clickhouse password
    #[clap(long, env = "CLICKHOUSE_PASSWORD")]
    pub password: String,
}

/// HTTP listener configuration options
#[derive(Debug, Clone, Parser)]
pub struct ApiOpts {
    /// Host to bind the API server to
    #[clap(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,
    /// Port to bind the API server to
    #[clap(long, env = "PORT", default_value = "3000")]
    pub port: u16,
    /// Comma separated list of allowed browser origins
    #[clap(long, env = "ALLOWED_ORIGINS", default_value = DEFAULT_ALLOWED_ORIGINS)]
    pub allowed_origins: String,
    /// Trust the first X-Forwarded-For hop when resolving the client address
    #[clap(long, env = "TRUST_PROXY")]
    pub trust_proxy: bool,
}

impl ApiOpts {
    /// Allowed origins as individual values.
    pub fn origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }
}

/// Rate limiter configuration options
#[derive(Debug, Clone, Parser)]
pub struct RateLimitOpts {
    /// Rate limit window in milliseconds
    #[clap(long, env = "RATE_LIMIT_WINDOW_MS", default_value = "60000")]
    pub window_ms: u64,
    /// Maximum number of requests per client within one window
    #[clap(long, env = "RATE_LIMIT_MAX_REQUESTS", default_value = "120")]
    pub max_requests: u64,
}

impl RateLimitOpts {
    /// Smallest accepted window.
    pub const MIN_WINDOW_MS: u64 = 1000;

    /// Window duration with the floor applied.
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms.max(Self::MIN_WINDOW_MS))
    }

    /// Request budget with the floor applied.
    pub fn max_requests(&self) -> u64 {
        self.max_requests.max(1)
    }
}

/// Random sample pool configuration options
#[derive(Debug, Clone, Parser)]
pub struct PoolOpts {
    /// Number of photos fetched per random sample
    #[clap(long, env = "RANDOM_POOL_SIZE", default_value = "25")]
    pub random_pool_size: u64,
}

impl PoolOpts {
    /// Pool capacity with the floor applied.
    pub fn capacity(&self) -> usize {
        self.random_pool_size.max(1) as usize
    }
}

/// Cache-Control configuration for the cacheable routes
#[derive(Debug, Clone, Parser)]
pub struct CacheOpts {
    /// Max-age in seconds for the cities listing (0 disables caching)
    #[clap(long, env = "CACHE_SECONDS_CITIES", default_value = "300")]
    pub cities_seconds: u64,
    /// Max-age in seconds for the photo stats routes (0 disables caching)
    #[clap(long, env = "CACHE_SECONDS_STATS", default_value = "60")]
    pub stats_seconds: u64,
}

/// CLI options for the API server
#[derive(Debug, Clone, Parser)]
pub struct Opts {
    /// Clickhouse database configuration
    #[clap(flatten)]
    pub clickhouse: ClickhouseOpts,

    /// HTTP listener configuration
    #[clap(flatten)]
    pub api: ApiOpts,

    /// Rate limiter configuration
    #[clap(flatten)]
    pub rate_limit: RateLimitOpts,

    /// Random sample pool configuration
    #[clap(flatten)]
    pub pool: PoolOpts,

    /// Cache-Control configuration
    #[clap(flatten)]
    pub cache: CacheOpts,
}

/// CLI options for the photo ingest tool
#[derive(Debug, Clone, Parser)]
pub struct IngestOpts {
    /// Clickhouse database configuration
    #[clap(flatten)]
    pub clickhouse: ClickhouseOpts,

    /// Directory holding the photos to ingest
    #[clap(long, env = "PHOTOS_DIR")]
    pub photos_dir: PathBuf,

    /// Drop and re-create the photos table before ingesting
    #[clap(long)]
    pub drop: bool,
}

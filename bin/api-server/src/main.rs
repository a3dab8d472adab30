//! API server binary

use std::net::SocketAddr;

use api::CacheDirectives;
use clap::Parser;
use clickhouse_lib::ClickhouseReader;
use config::Opts;
use dotenvy::dotenv;
use runtime::rate_limiter::RateLimiter;
use server::{ServerSettings, run};
use tracing_subscriber::filter::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenv().ok();
    let opts = Opts::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let client = ClickhouseReader::new(
        opts.clickhouse.url.clone(),
        opts.clickhouse.db.clone(),
        opts.clickhouse.username.clone(),
        opts.clickhouse.password.clone(),
    )?;

    let limiter = RateLimiter::new(opts.rate_limit.max_requests(), opts.rate_limit.window());
    let settings = ServerSettings {
        allowed_origins: opts.api.origins(),
        trust_proxy: opts.api.trust_proxy,
        cache: CacheDirectives {
            cities_seconds: opts.cache.cities_seconds,
            stats_seconds: opts.cache.stats_seconds,
        },
    };

    let addr: SocketAddr = format!("{}:{}", opts.api.host, opts.api.port).parse()?;
    run(addr, client, opts.pool.capacity(), limiter, settings).await
}

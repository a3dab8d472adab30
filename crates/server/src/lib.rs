//! Helper utilities to launch the photoscope API server.
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cognitive_complexity)]

use std::{net::SocketAddr, sync::Arc};

use api::{ApiState, CacheDirectives};
use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::get,
};
use clickhouse_lib::ClickhouseReader;
use eyre::Result;
use runtime::{health, rate_limiter::RateLimiter, shutdown::ShutdownSignal};
mod rate_limit;
use rate_limit::RateLimitLayer;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info};

/// Prefix all API routes are nested under.
pub const API_PREFIX: &str = "api";

/// Settings for the outer middleware stack.
#[derive(Clone, Debug)]
pub struct ServerSettings {
    /// Browser origins allowed by CORS.
    pub allowed_origins: Vec<String>,
    /// Honor the first X-Forwarded-For hop when resolving client keys.
    pub trust_proxy: bool,
    /// Cache-Control max-ages for the cacheable routes.
    pub cache: CacheDirectives,
}

/// Build the full router: rate limited API under `/api`, bare `/health`
/// outside it, CORS and tracing over everything.
pub fn router(state: ApiState, limiter: RateLimiter, settings: &ServerSettings) -> Router {
    let allowed = Arc::new(settings.allowed_origins.clone());
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate({
            let allowed = Arc::clone(&allowed);
            move |origin: &HeaderValue, _| match origin.to_str() {
                Ok(origin) => {
                    allowed.iter().any(|o| o == origin)
                        || origin.starts_with("http://localhost:")
                        || origin.starts_with("http://127.0.0.1:")
                }
                Err(_) => false,
            }
        }))
        .allow_methods([Method::GET])
        .allow_headers(Any)
        .expose_headers(Any);
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let api_service = tower::ServiceBuilder::new()
        .layer(RateLimitLayer::new(limiter, settings.trust_proxy))
        .service(api::router(state, settings.cache));

    Router::new()
        .route("/health", get(health::handler))
        .nest_service(&format!("/{API_PREFIX}"), api_service)
        .layer(cors)
        .layer(trace)
}

/// Run the API server on the given address until SIGINT/SIGTERM.
pub async fn run(
    addr: SocketAddr,
    client: ClickhouseReader,
    pool_capacity: usize,
    limiter: RateLimiter,
    settings: ServerSettings,
) -> Result<()> {
    let state = ApiState::new(client, pool_capacity);
    // Detached background sweep; it never outlives the serve loop.
    let sweeper = limiter.spawn_sweeper();
    let app = router(state, limiter, &settings);

    info!("Starting API server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(ShutdownSignal::new())
        .await?;
    sweeper.abort();
    Ok(())
}

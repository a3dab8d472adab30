//! API route definitions

pub mod photos;
pub mod stats;

use crate::{ApiDoc, state::ApiState};
use axum::{
    Router,
    http::{HeaderValue, header},
    routing::get,
};
use tower_http::set_header::SetResponseHeaderLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Cache-Control max-ages for the cacheable route groups, in seconds.
#[derive(Debug, Clone, Copy)]
pub struct CacheDirectives {
    /// Max-age for the cities listing (0 disables caching)
    pub cities_seconds: u64,
    /// Max-age for the photo stats routes (0 disables caching)
    pub stats_seconds: u64,
}

impl Default for CacheDirectives {
    fn default() -> Self {
        Self { cities_seconds: 300, stats_seconds: 60 }
    }
}

fn cache_control(seconds: u64) -> SetResponseHeaderLayer<HeaderValue> {
    let value = if seconds == 0 {
        HeaderValue::from_static("no-store")
    } else {
        HeaderValue::from_str(&format!("public, max-age={seconds}")).expect("valid header value")
    };
    SetResponseHeaderLayer::overriding(header::CACHE_CONTROL, value)
}

/// Build the router with all API endpoints.
pub fn router(state: ApiState, cache: CacheDirectives) -> Router {
    // Randomized draws must never be cached.
    let random = Router::new()
        .route("/year", get(photos::year_photo))
        .route("/city", get(photos::city_photo))
        .layer(cache_control(0));
    let cities = Router::new()
        .route("/cities", get(photos::cities))
        .layer(cache_control(cache.cities_seconds));
    let stats = Router::new()
        .route("/photos/count", get(stats::photos_count))
        .route("/photos/hasYearPhoto", get(stats::has_year_photo))
        .layer(cache_control(cache.stats_seconds));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .route("/", get(stats::status))
        .merge(random)
        .merge(cities)
        .merge(stats)
        .with_state(state)
}

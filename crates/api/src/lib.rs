//! Thin HTTP API serving photo quiz prompts from `ClickHouse`

mod helpers;
pub mod routes;
mod state;

pub use routes::{CacheDirectives, router};
pub use state::{ApiState, DEFAULT_POOL_CAPACITY, PhotoSampler};

use utoipa::OpenApi;

/// `OpenAPI` documentation structure
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        routes::stats::status,
        routes::photos::year_photo,
        routes::photos::city_photo,
        routes::photos::cities,
        routes::stats::photos_count,
        routes::stats::has_year_photo
    ),
    components(
        schemas(
            api_types::StatusResponse,
            api_types::PhotoResponse,
            api_types::CitiesResponse,
            api_types::PhotoCountResponse,
            api_types::HasYearPhotoResponse,
            api_types::HealthResponse,
            api_types::ErrorResponse
        )
    ),
    tags(
        (name = "photoscope", description = "Photoscope API endpoints")
    ),
    info(
        title = "Photoscope API",
        description = "API for serving random photo quiz prompts",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;

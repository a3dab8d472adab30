//! Photo endpoints: the pool-backed random draws and the city listing

use crate::{helpers::database_error, state::ApiState};
use api_types::{CitiesResponse, ErrorResponse, PhotoResponse};
use axum::{Json, extract::State};
use clickhouse_lib::PhotoField;

#[utoipa::path(
    get,
    path = "/year",
    responses(
        (status = 200, description = "Random photo with a year", body = PhotoResponse),
        (status = 404, description = "No photo with a year exists", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "photoscope"
)]
/// Get a random photo that has a year
pub async fn year_photo(
    State(state): State<ApiState>,
) -> Result<Json<PhotoResponse>, ErrorResponse> {
    pooled_photo(&state, PhotoField::Year).await
}

#[utoipa::path(
    get,
    path = "/city",
    responses(
        (status = 200, description = "Random photo with a city", body = PhotoResponse),
        (status = 404, description = "No photo with a city exists", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "photoscope"
)]
/// Get a random photo that has a city
pub async fn city_photo(
    State(state): State<ApiState>,
) -> Result<Json<PhotoResponse>, ErrorResponse> {
    pooled_photo(&state, PhotoField::City).await
}

/// Draw one photo from the pool for `field`. An empty draw is a 404, never
/// cached; a sampler failure reaches every caller that joined the refill and
/// each one reports its own 500.
async fn pooled_photo(
    state: &ApiState,
    field: PhotoField,
) -> Result<Json<PhotoResponse>, ErrorResponse> {
    let drawn = state
        .pool
        .fetch_random(field)
        .await
        .map_err(|e| database_error(&format!("sample photos by {field}"), e))?;

    drawn
        .map(|row| Json(PhotoResponse::from(row)))
        .ok_or_else(|| ErrorResponse::not_found(format!("No photo with a {field} found")))
}

#[utoipa::path(
    get,
    path = "/cities",
    responses(
        (status = 200, description = "Distinct city values", body = CitiesResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "photoscope"
)]
/// Get the sorted list of distinct cities
pub async fn cities(State(state): State<ApiState>) -> Result<Json<CitiesResponse>, ErrorResponse> {
    let cities =
        state.client.distinct_cities().await.map_err(|e| database_error("list cities", e))?;
    Ok(Json(CitiesResponse { cities }))
}

//! Status and photo stats endpoints

use crate::{helpers::database_error, state::ApiState};
use api_types::{ErrorResponse, HasYearPhotoResponse, PhotoCountResponse, StatusResponse};
use axum::{Json, extract::State};

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "API status payload", body = StatusResponse)
    ),
    tag = "photoscope"
)]
/// API root status payload
pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse { status: "Photos goes here".to_owned() })
}

#[utoipa::path(
    get,
    path = "/photos/count",
    responses(
        (status = 200, description = "Total number of photos", body = PhotoCountResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "photoscope"
)]
/// Get the total number of photos
pub async fn photos_count(
    State(state): State<ApiState>,
) -> Result<Json<PhotoCountResponse>, ErrorResponse> {
    let count =
        state.client.photo_count().await.map_err(|e| database_error("count photos", e))?;
    Ok(Json(PhotoCountResponse { count }))
}

#[utoipa::path(
    get,
    path = "/photos/hasYearPhoto",
    responses(
        (status = 200, description = "Whether any photo has a year", body = HasYearPhotoResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "photoscope"
)]
/// Whether at least one photo has a year
pub async fn has_year_photo(
    State(state): State<ApiState>,
) -> Result<Json<HasYearPhotoResponse>, ErrorResponse> {
    let has_year_photo = state
        .client
        .has_year_photo()
        .await
        .map_err(|e| database_error("check year photos", e))?;
    Ok(Json(HasYearPhotoResponse { has_year_photo }))
}

//! Data types for the photoscope API.
//!
//! These structs define the JSON responses returned by the API server. They
//! are provided in a separate crate so that consumers such as the quiz
//! frontend can depend on them without pulling in the rest of the server
//! implementation.

#![allow(missing_docs)]

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use clickhouse_lib::PhotoRow;
use serde::Serialize;
use utoipa::ToSchema;

/// Payload returned by the API root, kept byte-compatible with the original
/// service.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// A single photo quiz prompt.
///
/// Wire field names match the original service (`yearOptions`,
/// `cityOptions`); absent optional fields are omitted rather than null.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PhotoResponse {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(rename = "yearOptions", skip_serializing_if = "Vec::is_empty")]
    pub year_options: Vec<String>,
    #[serde(rename = "cityOptions", skip_serializing_if = "Vec::is_empty")]
    pub city_options: Vec<String>,
}

impl From<PhotoRow> for PhotoResponse {
    fn from(row: PhotoRow) -> Self {
        Self {
            name: row.name,
            year: row.year,
            city: row.city,
            year_options: row.year_options,
            city_options: row.city_options,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CitiesResponse {
    pub cities: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PhotoCountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HasYearPhotoResponse {
    #[serde(rename = "hasYearPhoto")]
    pub has_year_photo: bool,
}

/// Problem-details style error body used by every failing endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
}

impl ErrorResponse {
    /// Create a new [`ErrorResponse`].
    pub fn new(
        r#type: impl Into<String>,
        title: impl Into<String>,
        status: StatusCode,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            r#type: r#type.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: detail.into(),
        }
    }

    /// Generic 500 returned when a store query fails. The underlying error is
    /// logged server-side, never echoed to the client.
    pub fn database_error() -> Self {
        Self::new(
            "database",
            "Internal Server Error",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Database operation failed",
        )
    }

    /// 404 with a descriptive message.
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new("not-found", "Not Found", StatusCode::NOT_FOUND, detail)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

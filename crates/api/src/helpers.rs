//! Common helper functions used across API endpoints

use api_types::ErrorResponse;

/// Create a database error response with logging
pub(crate) fn database_error(operation: &str, error: impl std::fmt::Display) -> ErrorResponse {
    tracing::error!(operation = operation, error = %error, "Database operation failed");
    ErrorResponse::database_error()
}

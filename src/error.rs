//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::processors::ProcessorError;

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error message.
///
/// # Error Categories
///
/// - **Client errors**: malformed request bodies and processor rejections
///   remapped by the card update handler (400)
/// - **Resolution errors**: unknown organization (404) or missing caller (401)
/// - **Backend errors**: database and processor failures (500)
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The payment processor failed or returned something we cannot use.
    ///
    /// Rejections only reach this variant on read paths. The update handler
    /// turns them into `InvalidRequest` before they get here.
    #[error("Processor error: {0}")]
    Processor(#[from] ProcessorError),

    /// No authenticated user was forwarded by the gateway.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Authentication credentials were not provided.")]
    Unauthenticated,

    /// The `{organization}` path segment does not resolve to an organization.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Organization not found")]
    OrganizationNotFound,

    /// The configured broker organization is missing from the database.
    #[error("Broker organization '{0}' not found")]
    BrokerNotFound(String),

    /// Request body or parameters are invalid, or the processor rejected the
    /// submitted payment method.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String is returned verbatim as `detail`.
    #[error("{0}")]
    InvalidRequest(String),
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "detail": "Human-readable error message",
///   "code": "error_type"
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `InvalidRequest` → 400 Bad Request
/// - `Unauthenticated` → 401 Unauthorized
/// - `OrganizationNotFound` → 404 Not Found
/// - `Database`, `Processor`, `BrokerNotFound` → 500 Internal Server Error
///   (details are logged, never sent to the client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, detail) = match self {
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "not_authenticated",
                self.to_string(),
            ),
            AppError::OrganizationNotFound => {
                (StatusCode::NOT_FOUND, "not_found", self.to_string())
            }
            AppError::Database(_) | AppError::Processor(_) | AppError::BrokerNotFound(_) => {
                tracing::error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "detail": detail,
            "code": code,
        }));

        (status, body).into_response()
    }
}

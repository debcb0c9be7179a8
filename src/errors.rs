use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Standard error payload returned by every endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Not Found",
    "code": "DISTRIBUTION_NOT_FOUND",
    "message": "No distribution exists with id 42",
    "request_id": "req-abc123xyz",
    "timestamp": "2026-01-09T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request")
    #[schema(example = "Not Found")]
    pub error: String,
    /// Machine-readable domain error code
    #[schema(example = "DISTRIBUTION_NOT_FOUND")]
    pub code: String,
    /// Human-readable error description
    #[schema(example = "No distribution exists with id 42")]
    pub message: String,
    /// Unique request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "req-abc123xyz")]
    pub request_id: Option<String>,
    /// ISO 8601 timestamp when the error occurred
    #[schema(example = "2026-01-09T10:30:00.000Z")]
    pub timestamp: String,
}

/// Closed enumeration of the domain errors this service can surface.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("No distribution exists with id {0}")]
    DistributionNotFound(i64),

    #[error("No customer exists with id {0}")]
    CustomerNotFound(i64),

    #[error("No order exists with id {0}")]
    OrderNotFound(i64),

    #[error("An active pre-sale already exists for customer {customer_id} in distribution {distribution_id}")]
    ExistingOrder {
        customer_id: i64,
        distribution_id: i64,
    },

    #[error("Parameters {0} must be numbers")]
    ParametersMustBeNumbers(String),

    #[error("Parameters {0} must be values greater than 0")]
    ParametersMustBePositive(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        ServiceError::InternalError(err.to_string())
    }
}

impl ServiceError {
    /// Machine-readable code surfaced in error bodies.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::DistributionNotFound(_) => "DISTRIBUTION_NOT_FOUND",
            Self::CustomerNotFound(_) => "CUSTOMER_NOT_FOUND",
            Self::OrderNotFound(_) => "ORDER_NOT_FOUND",
            Self::ExistingOrder { .. } => "EXISTING_ORDER",
            Self::ParametersMustBeNumbers(_) => "PARAMETERS_ARE_NUMBERS",
            Self::ParametersMustBePositive(_) => "PARAMETERS_POSITIVE_VALUES",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::DistributionNotFound(_) | Self::CustomerNotFound(_) | Self::OrderNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::ExistingOrder { .. } => StatusCode::CONFLICT,
            Self::ParametersMustBeNumbers(_)
            | Self::ParametersMustBePositive(_)
            | Self::ValidationError(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InternalError(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            code: self.error_code().to_string(),
            message: self.response_message(),
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

//! Error handling for the TrackIt inventory server
//!
//! Maps domain and storage failures onto consistent JSON error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use shared::DomainError;
use thiserror::Error;

/// Unique constraint guarding product codes
pub const PRODUCT_CODE_CONSTRAINT: &str = "products_code_key";

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // Business rule errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Request payload errors
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::ValidationError(errors.to_string())
    }
}

/// Convert a unique violation on `products.code` into `DuplicateCode`
pub fn map_code_conflict(err: sqlx::Error, code: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() && db_err.constraint() == Some(PRODUCT_CODE_CONSTRAINT) {
            return DomainError::DuplicateCode(code.to_string()).into();
        }
    }
    AppError::DatabaseError(err)
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorDetail {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
            details: None,
        }
    }

    fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

fn domain_error_detail(err: &DomainError) -> (StatusCode, ErrorDetail) {
    let message = err.to_string();
    match err {
        DomainError::Validation { field, message } => (
            StatusCode::BAD_REQUEST,
            ErrorDetail::new("VALIDATION_ERROR", message.clone()).with_field(field.clone()),
        ),
        DomainError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            ErrorDetail::new("NOT_FOUND", message),
        ),
        DomainError::ProductNotFound(product_id) => (
            StatusCode::NOT_FOUND,
            ErrorDetail::new("PRODUCT_NOT_FOUND", message)
                .with_details(json!({ "product_id": product_id })),
        ),
        DomainError::Forbidden { required, actual } => (
            StatusCode::FORBIDDEN,
            ErrorDetail::new("FORBIDDEN", message)
                .with_details(json!({ "required": required, "actual": actual })),
        ),
        DomainError::InvalidTransition {
            entity,
            from,
            requested,
        } => (
            StatusCode::CONFLICT,
            ErrorDetail::new("INVALID_TRANSITION", message).with_details(json!({
                "entity": entity,
                "from": from,
                "requested": requested,
            })),
        ),
        DomainError::BookingNotReady { status } => (
            StatusCode::CONFLICT,
            ErrorDetail::new("BOOKING_NOT_READY", message)
                .with_details(json!({ "status": status })),
        ),
        DomainError::AlreadyReviewed { status } => (
            StatusCode::CONFLICT,
            ErrorDetail::new("ALREADY_REVIEWED", message)
                .with_details(json!({ "status": status })),
        ),
        DomainError::InsufficientStock {
            product_id,
            product_name,
            available,
            requested,
        } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorDetail::new("INSUFFICIENT_STOCK", message).with_details(json!({
                "product_id": product_id,
                "product_name": product_name,
                "available": available,
                "requested": requested,
            })),
        ),
        DomainError::DuplicateCode(_) => (
            StatusCode::CONFLICT,
            ErrorDetail::new("DUPLICATE_CODE", message).with_field("code"),
        ),
        DomainError::CodeGenerationExhausted { category, attempts } => (
            StatusCode::CONFLICT,
            ErrorDetail::new("CODE_GENERATION_EXHAUSTED", message)
                .with_details(json!({ "category": category, "attempts": attempts })),
        ),
    }
}

impl AppError {
    fn status_and_detail(&self) -> (StatusCode, ErrorDetail) {
        match self {
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("UNAUTHORIZED", msg.clone()),
            ),
            AppError::Domain(err) => domain_error_detail(err),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", msg.clone()),
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("CONFIGURATION_ERROR", format!("Configuration error: {}", msg)),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("STORAGE_ERROR", "A storage error occurred"),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", "An internal server error occurred"),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = self.status_and_detail();

        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::warn!(code = %error_detail.code, "request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers and services
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{BookingStatus, Role};
    use uuid::Uuid;

    fn status_of(err: AppError) -> StatusCode {
        err.status_and_detail().0
    }

    #[test]
    fn test_domain_status_codes() {
        assert_eq!(
            status_of(DomainError::validation("customer.name", "required").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::NotFound("Booking".into()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(
                DomainError::Forbidden {
                    required: vec![Role::Accountant],
                    actual: Role::Moderator,
                }
                .into()
            ),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(
                DomainError::InvalidTransition {
                    entity: "booking",
                    from: "approved".into(),
                    requested: "approved".into(),
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(
                DomainError::BookingNotReady {
                    status: BookingStatus::Pending
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(
                DomainError::InsufficientStock {
                    product_id: Uuid::new_v4(),
                    product_name: "Lamp".into(),
                    available: 1,
                    requested: 2,
                }
                .into()
            ),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_storage_errors_hide_details() {
        let (status, detail) = AppError::DatabaseError(sqlx::Error::RowNotFound).status_and_detail();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(detail.code, "STORAGE_ERROR");
        assert!(detail.details.is_none());
    }

    #[test]
    fn test_non_database_error_is_not_a_code_conflict() {
        let err = map_code_conflict(sqlx::Error::RowNotFound, "EC000001");
        assert!(matches!(err, AppError::DatabaseError(_)));
    }

    #[test]
    fn test_validation_detail_carries_field() {
        let (_, detail) =
            AppError::from(DomainError::validation("lines", "at least one line")).status_and_detail();
        assert_eq!(detail.field.as_deref(), Some("lines"));
    }
}

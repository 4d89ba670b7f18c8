//! Domain error taxonomy

use thiserror::Error;
use uuid::Uuid;

use crate::models::{BookingStatus, RequestStatus, Role};

/// Errors raised by domain rules before or during a state change
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Product {0} not found")]
    ProductNotFound(Uuid),

    #[error("Operation requires one of {required:?}, caller is {actual:?}")]
    Forbidden { required: Vec<Role>, actual: Role },

    #[error("Invalid {entity} transition from {from} to {requested}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        requested: String,
    },

    #[error("Booking is {status} and not ready for delivery")]
    BookingNotReady { status: BookingStatus },

    #[error("Permission request already reviewed ({status})")]
    AlreadyReviewed { status: RequestStatus },

    #[error("Insufficient stock for {product_name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: Uuid,
        product_name: String,
        available: i32,
        requested: i32,
    },

    #[error("Product code {0} is already in use")]
    DuplicateCode(String),

    #[error("Could not generate a free product code for {category} after {attempts} attempts")]
    CodeGenerationExhausted { category: String, attempts: u32 },
}

impl DomainError {
    /// Shorthand for a field-level validation failure
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        DomainError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for domain rules
pub type DomainResult<T> = Result<T, DomainError>;

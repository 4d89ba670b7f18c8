//! Stock permission requests
//!
//! A storeman asks to bring stock in from a supplier; an accountant approves
//! it (restocking an existing product or creating a new one) or rejects it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

/// Request review status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "request_status", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    /// A request leaves `pending` exactly once
    pub fn review(self, decision: ReviewDecision) -> DomainResult<RequestStatus> {
        match self {
            RequestStatus::Pending => Ok(decision.status()),
            status => Err(DomainError::AlreadyReviewed { status }),
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accountant's verdict on a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl ReviewDecision {
    pub fn status(&self) -> RequestStatus {
        match self {
            ReviewDecision::Approved => RequestStatus::Approved,
            ReviewDecision::Rejected => RequestStatus::Rejected,
        }
    }
}

/// A stored permission request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PermissionRequest {
    pub id: Uuid,
    pub delivery_man_id: Uuid,
    pub supplier_name: String,
    pub product_code: String,
    pub product_name: String,
    pub category: String,
    pub mrp: Decimal,
    pub selling_price: Decimal,
    pub quantity: i32,
    /// Reference returned by the file storage collaborator
    pub invoice_image: Option<String>,
    /// The code was drawn by the server, so approval must create a product
    pub code_generated: bool,
    pub status: RequestStatus,
    pub accountant_id: Option<Uuid>,
    pub review_notes: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload submitted by a storeman
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPermissionRequest {
    pub supplier_name: String,
    /// Generated from the category when absent or blank
    pub product_code: Option<String>,
    pub product_name: String,
    pub category: String,
    pub mrp: Decimal,
    pub selling_price: Decimal,
    pub quantity: i32,
    pub invoice_image: Option<String>,
}

/// Permission request list filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionRequestFilter {
    pub status: Option<RequestStatus>,
    pub delivery_man_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_request_can_be_reviewed() {
        assert_eq!(
            RequestStatus::Pending.review(ReviewDecision::Approved),
            Ok(RequestStatus::Approved)
        );
        assert_eq!(
            RequestStatus::Pending.review(ReviewDecision::Rejected),
            Ok(RequestStatus::Rejected)
        );
    }

    #[test]
    fn test_reviewed_request_cannot_be_reviewed_again() {
        for status in [RequestStatus::Approved, RequestStatus::Rejected] {
            let err = status.review(ReviewDecision::Approved).unwrap_err();
            assert_eq!(err, DomainError::AlreadyReviewed { status });
        }
    }
}

//! Payment models
//!
//! Payments follow their own small state machine advanced by accountants.
//! They never affect stock.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "payment_status", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }

    /// Check a status change requested by an accountant.
    ///
    /// Keeping the same status is allowed so details can be corrected. A paid
    /// payment can still fail (chargeback) but never returns to pending.
    pub fn transition_to(self, next: PaymentStatus) -> DomainResult<PaymentStatus> {
        use PaymentStatus::*;
        let allowed = self == next
            || matches!(
                (self, next),
                (Pending, Paid)
                    | (Pending, Failed)
                    | (Failed, Pending)
                    | (Failed, Paid)
                    | (Paid, Failed)
            );
        if allowed {
            Ok(next)
        } else {
            Err(DomainError::InvalidTransition {
                entity: "payment",
                from: self.as_str().to_string(),
                requested: next.as_str().to_string(),
            })
        }
    }
}

/// Payment record, one per booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub status: PaymentStatus,
    pub method: Option<String>,
    pub transaction_id: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Accountant update to a payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentUpdate {
    pub status: PaymentStatus,
    pub method: Option<String>,
    pub transaction_id: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_transitions() {
        use PaymentStatus::*;
        assert_eq!(Pending.transition_to(Paid), Ok(Paid));
        assert_eq!(Pending.transition_to(Failed), Ok(Failed));
        assert_eq!(Failed.transition_to(Pending), Ok(Pending));
        assert_eq!(Failed.transition_to(Paid), Ok(Paid));
        assert_eq!(Paid.transition_to(Paid), Ok(Paid));
        assert_eq!(Paid.transition_to(Failed), Ok(Failed));
    }

    #[test]
    fn test_paid_never_returns_to_pending() {
        use PaymentStatus::*;
        assert!(Paid.transition_to(Pending).is_err());
    }
}

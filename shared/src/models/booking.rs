//! Booking models, the booking state machine and booking pricing

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PaymentStatus, Product, Role};
use crate::error::{DomainError, DomainResult};
use crate::validation::validate_booking_lines;

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "booking_status", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Delivered,
    NotDelivered,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Delivered => "delivered",
            BookingStatus::NotDelivered => "not_delivered",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "approved" => Some(BookingStatus::Approved),
            "rejected" => Some(BookingStatus::Rejected),
            "delivered" => Some(BookingStatus::Delivered),
            "not_delivered" => Some(BookingStatus::NotDelivered),
            _ => None,
        }
    }

    /// No further status change is possible from a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Rejected | BookingStatus::Delivered | BookingStatus::NotDelivered
        )
    }

    /// Apply `action`, returning the resulting status.
    ///
    /// Every action has exactly one source status; anything else is an
    /// `InvalidTransition`.
    pub fn apply(self, action: BookingAction) -> DomainResult<BookingStatus> {
        if self == action.source() {
            Ok(action.target())
        } else {
            Err(DomainError::InvalidTransition {
                entity: "booking",
                from: self.as_str().to_string(),
                requested: action.target().as_str().to_string(),
            })
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status-changing actions on a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingAction {
    Approve,
    Reject,
    MarkDelivered,
    MarkNotDelivered,
}

impl BookingAction {
    pub fn source(&self) -> BookingStatus {
        match self {
            BookingAction::Approve | BookingAction::Reject => BookingStatus::Pending,
            BookingAction::MarkDelivered | BookingAction::MarkNotDelivered => {
                BookingStatus::Approved
            }
        }
    }

    pub fn target(&self) -> BookingStatus {
        match self {
            BookingAction::Approve => BookingStatus::Approved,
            BookingAction::Reject => BookingStatus::Rejected,
            BookingAction::MarkDelivered => BookingStatus::Delivered,
            BookingAction::MarkNotDelivered => BookingStatus::NotDelivered,
        }
    }

    /// Role allowed to trigger the action
    pub fn role(&self) -> Role {
        match self {
            BookingAction::Approve | BookingAction::Reject => Role::Accountant,
            BookingAction::MarkDelivered | BookingAction::MarkNotDelivered => Role::Storeman,
        }
    }
}

/// How the customer pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "payment_type", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    OnlinePaid,
    CashOnDelivery,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::OnlinePaid => "online_paid",
            PaymentType::CashOnDelivery => "cash_on_delivery",
        }
    }

    /// Status of the payment row created alongside a booking
    pub fn initial_payment_status(&self) -> PaymentStatus {
        match self {
            PaymentType::OnlinePaid => PaymentStatus::Paid,
            PaymentType::CashOnDelivery => PaymentStatus::Pending,
        }
    }
}

/// Customer contact captured on a booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub phone: String,
    pub address: String,
}

impl Customer {
    /// Copy with surrounding whitespace removed
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address: self.address.trim().to_string(),
        }
    }
}

/// A customer booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Booking {
    pub id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub payment_type: PaymentType,
    /// Sum of line totals at creation; never recomputed
    pub amount: Decimal,
    pub status: BookingStatus,
    pub moderator_id: Uuid,
    pub accountant_id: Option<Uuid>,
    pub storeman_id: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn customer(&self) -> Customer {
        Customer {
            name: self.customer_name.clone(),
            phone: self.customer_phone.clone(),
            address: self.customer_address.clone(),
        }
    }
}

/// A promised product line, priced when the booking was made
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BookingLineItem {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl BookingLineItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Requested line on a new booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBookingLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Input for creating a booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub customer: Customer,
    pub payment_type: PaymentType,
    pub lines: Vec<NewBookingLine>,
}

/// Booking list filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    /// Matches customer name or phone
    pub search: Option<String>,
}

/// A line priced against the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotedLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl QuotedLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Priced booking ready to be persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingQuote {
    pub lines: Vec<QuotedLine>,
    pub amount: Decimal,
}

/// Validate the lines as submitted, then merge repeats of the same product
pub fn prepare_lines(lines: &[NewBookingLine]) -> DomainResult<Vec<NewBookingLine>> {
    validate_booking_lines(lines)?;
    Ok(merge_lines(lines))
}

/// Combine lines for the same product, keeping first-seen order
pub fn merge_lines(lines: &[NewBookingLine]) -> Vec<NewBookingLine> {
    let mut merged: Vec<NewBookingLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|m| m.product_id == line.product_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => merged.push(*line),
        }
    }
    merged
}

/// Price `lines` against the observed catalog and check stock on hand.
///
/// The stock check is advisory: nothing is reserved, stock only moves when
/// the booking is delivered.
pub fn quote_booking(
    lines: &[NewBookingLine],
    catalog: &HashMap<Uuid, Product>,
) -> DomainResult<BookingQuote> {
    let mut quoted = Vec::with_capacity(lines.len());
    for line in lines {
        let product = catalog
            .get(&line.product_id)
            .ok_or(DomainError::ProductNotFound(line.product_id))?;

        let available = product.stock_quantity;
        if line.quantity > available {
            return Err(DomainError::InsufficientStock {
                product_id: product.id,
                product_name: product.name.clone(),
                available,
                requested: line.quantity,
            });
        }

        quoted.push(QuotedLine {
            product_id: product.id,
            quantity: line.quantity,
            unit_price: product.price,
        });
    }

    let amount = quoted.iter().map(QuotedLine::line_total).sum();
    Ok(BookingQuote {
        lines: quoted,
        amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn product(price: &str, stock: i32) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            code: "EC123456".to_string(),
            sku: None,
            name: "Headphones".to_string(),
            category: "Electronics".to_string(),
            description: None,
            price: Decimal::from_str(price).unwrap(),
            stock_quantity: stock,
            backorder_quantity: 0,
            opening_stock: stock,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_transition_table() {
        use BookingAction::*;
        use BookingStatus::*;

        assert_eq!(Pending.apply(Approve), Ok(Approved));
        assert_eq!(Pending.apply(Reject), Ok(Rejected));
        assert_eq!(Approved.apply(MarkDelivered), Ok(Delivered));
        assert_eq!(Approved.apply(MarkNotDelivered), Ok(NotDelivered));

        assert!(Approved.apply(Approve).is_err());
        assert!(Pending.apply(MarkDelivered).is_err());
        assert!(Rejected.apply(Approve).is_err());
        assert!(Delivered.apply(MarkNotDelivered).is_err());
    }

    #[test]
    fn test_invalid_transition_reports_source_and_target() {
        let err = BookingStatus::Approved
            .apply(BookingAction::Approve)
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                entity: "booking",
                from: "approved".to_string(),
                requested: "approved".to_string(),
            }
        );
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!BookingStatus::Pending.is_terminal());
        assert!(!BookingStatus::Approved.is_terminal());
        assert!(BookingStatus::Rejected.is_terminal());
        assert!(BookingStatus::Delivered.is_terminal());
        assert!(BookingStatus::NotDelivered.is_terminal());
    }

    #[test]
    fn test_payment_seeding() {
        assert_eq!(
            PaymentType::OnlinePaid.initial_payment_status(),
            PaymentStatus::Paid
        );
        assert_eq!(
            PaymentType::CashOnDelivery.initial_payment_status(),
            PaymentStatus::Pending
        );
    }

    #[test]
    fn test_merge_lines_sums_duplicates() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let merged = merge_lines(&[
            NewBookingLine { product_id: a, quantity: 1 },
            NewBookingLine { product_id: b, quantity: 2 },
            NewBookingLine { product_id: a, quantity: 3 },
        ]);
        assert_eq!(
            merged,
            vec![
                NewBookingLine { product_id: a, quantity: 4 },
                NewBookingLine { product_id: b, quantity: 2 },
            ]
        );
    }

    #[test]
    fn test_quote_prices_lines_from_catalog() {
        let p = product("19.99", 5);
        let catalog = HashMap::from([(p.id, p.clone())]);

        let quote = quote_booking(
            &[NewBookingLine { product_id: p.id, quantity: 3 }],
            &catalog,
        )
        .unwrap();

        assert_eq!(quote.lines.len(), 1);
        assert_eq!(quote.lines[0].unit_price, p.price);
        assert_eq!(quote.amount, Decimal::from_str("59.97").unwrap());
    }

    #[test]
    fn test_quote_rejects_quantity_above_stock() {
        let p = product("10.00", 2);
        let catalog = HashMap::from([(p.id, p.clone())]);

        let err = quote_booking(
            &[NewBookingLine { product_id: p.id, quantity: 3 }],
            &catalog,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            DomainError::InsufficientStock { available: 2, requested: 3, .. }
        ));
    }

    #[test]
    fn test_quote_unknown_product() {
        let missing = Uuid::new_v4();
        let err = quote_booking(
            &[NewBookingLine { product_id: missing, quantity: 1 }],
            &HashMap::new(),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::ProductNotFound(missing));
    }
}

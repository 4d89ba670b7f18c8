//! Booking tests
//!
//! Tests for the booking lifecycle including:
//! - Property: Booking amount equals the sum of line totals at creation
//! - Property: Each status change has exactly one legal source status
//! - Property: Merging duplicate lines conserves quantities
//! - Payment seeding by payment type

use std::collections::HashMap;

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    merge_lines, prepare_lines, quote_booking, Actor, BookingAction, BookingStatus, DomainError,
    NewBookingLine, PaymentStatus, PaymentType, Product, Role,
};
use uuid::Uuid;

fn product(cents: i64, stock: i32) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4(),
        code: "EC100200".to_string(),
        sku: None,
        name: "Earbuds".to_string(),
        category: "Electronics".to_string(),
        description: None,
        price: Decimal::new(cents, 2),
        stock_quantity: stock,
        backorder_quantity: 0,
        opening_stock: stock,
        created_at: now,
        updated_at: now,
    }
}

fn all_statuses() -> [BookingStatus; 5] {
    [
        BookingStatus::Pending,
        BookingStatus::Approved,
        BookingStatus::Rejected,
        BookingStatus::Delivered,
        BookingStatus::NotDelivered,
    ]
}

fn all_actions() -> [BookingAction; 4] {
    [
        BookingAction::Approve,
        BookingAction::Reject,
        BookingAction::MarkDelivered,
        BookingAction::MarkNotDelivered,
    ]
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// 2 x 10.00 + 1 x 5.50 = 25.50
    #[test]
    fn test_quote_sums_line_totals() {
        let p1 = product(1000, 10);
        let p2 = product(550, 3);
        let catalog = HashMap::from([(p1.id, p1.clone()), (p2.id, p2.clone())]);
        let lines = vec![
            NewBookingLine {
                product_id: p1.id,
                quantity: 2,
            },
            NewBookingLine {
                product_id: p2.id,
                quantity: 1,
            },
        ];

        let quote = quote_booking(&lines, &catalog).unwrap();

        assert_eq!(quote.amount, Decimal::new(2550, 2));
        assert_eq!(quote.lines.len(), 2);
        assert_eq!(quote.lines[0].unit_price, Decimal::new(1000, 2));
    }

    /// Requesting more than is on hand is refused at booking time
    #[test]
    fn test_quote_rejects_insufficient_stock() {
        let p = product(1000, 1);
        let catalog = HashMap::from([(p.id, p.clone())]);
        let lines = vec![NewBookingLine {
            product_id: p.id,
            quantity: 5,
        }];

        let err = quote_booking(&lines, &catalog).unwrap_err();

        assert_eq!(
            err,
            DomainError::InsufficientStock {
                product_id: p.id,
                product_name: "Earbuds".to_string(),
                available: 1,
                requested: 5,
            }
        );
    }

    #[test]
    fn test_quote_unknown_product() {
        let missing = Uuid::new_v4();
        let lines = vec![NewBookingLine {
            product_id: missing,
            quantity: 1,
        }];

        let err = quote_booking(&lines, &HashMap::new()).unwrap_err();
        assert_eq!(err, DomainError::ProductNotFound(missing));
    }

    #[test]
    fn test_merge_keeps_first_seen_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let merged = merge_lines(&[
            NewBookingLine {
                product_id: a,
                quantity: 1,
            },
            NewBookingLine {
                product_id: b,
                quantity: 2,
            },
            NewBookingLine {
                product_id: a,
                quantity: 3,
            },
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].product_id, a);
        assert_eq!(merged[0].quantity, 4);
        assert_eq!(merged[1].product_id, b);
    }

    /// A negative line is refused even when a later line for the same
    /// product would make the merged total positive
    #[test]
    fn test_prepare_rejects_negative_line_before_merging() {
        let p = Uuid::new_v4();
        let lines = [
            NewBookingLine {
                product_id: p,
                quantity: -3,
            },
            NewBookingLine {
                product_id: p,
                quantity: 5,
            },
        ];

        let err = prepare_lines(&lines).unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[test]
    fn test_prepare_merges_valid_lines() {
        let p = Uuid::new_v4();
        let lines = [
            NewBookingLine {
                product_id: p,
                quantity: 2,
            },
            NewBookingLine {
                product_id: p,
                quantity: 5,
            },
        ];

        let merged = prepare_lines(&lines).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].quantity, 7);
    }

    #[test]
    fn test_review_transitions() {
        assert_eq!(
            BookingStatus::Pending.apply(BookingAction::Approve),
            Ok(BookingStatus::Approved)
        );
        assert_eq!(
            BookingStatus::Pending.apply(BookingAction::Reject),
            Ok(BookingStatus::Rejected)
        );

        let err = BookingStatus::Approved
            .apply(BookingAction::Reject)
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { entity: "booking", .. }));
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
    fn test_payment_seeded_from_payment_type() {
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
    fn test_payment_transitions() {
        assert!(PaymentStatus::Pending.transition_to(PaymentStatus::Paid).is_ok());
        assert!(PaymentStatus::Failed.transition_to(PaymentStatus::Paid).is_ok());
        assert!(PaymentStatus::Paid.transition_to(PaymentStatus::Paid).is_ok());
        assert!(PaymentStatus::Paid.transition_to(PaymentStatus::Pending).is_err());
        assert!(PaymentStatus::Paid.transition_to(PaymentStatus::Failed).is_ok());
    }

    #[test]
    fn test_action_roles() {
        let accountant = Actor::new(Uuid::new_v4(), Role::Accountant);
        let storeman = Actor::new(Uuid::new_v4(), Role::Storeman);

        assert!(accountant.require(&[BookingAction::Approve.role()]).is_ok());
        assert!(storeman.require(&[BookingAction::Approve.role()]).is_err());
        assert!(storeman
            .require(&[BookingAction::MarkDelivered.role()])
            .is_ok());
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_value(BookingStatus::NotDelivered).unwrap();
        assert_eq!(json, "not_delivered");
        let json = serde_json::to_value(PaymentType::CashOnDelivery).unwrap();
        assert_eq!(json, "cash_on_delivery");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

fn priced_lines() -> impl Strategy<Value = Vec<(i64, i32)>> {
    prop::collection::vec((1i64..100_000, 1i32..20), 1..8)
}

proptest! {
    /// Property: amount == Σ quantity × unit price over all lines
    #[test]
    fn test_amount_is_sum_of_lines(lines in priced_lines()) {
        let products: Vec<Product> = lines
            .iter()
            .map(|(cents, qty)| product(*cents, *qty))
            .collect();
        let catalog: HashMap<Uuid, Product> =
            products.iter().map(|p| (p.id, p.clone())).collect();
        let requested: Vec<NewBookingLine> = products
            .iter()
            .zip(&lines)
            .map(|(p, (_, qty))| NewBookingLine { product_id: p.id, quantity: *qty })
            .collect();

        let quote = quote_booking(&requested, &catalog).unwrap();

        let expected: Decimal = lines
            .iter()
            .map(|(cents, qty)| Decimal::new(*cents, 2) * Decimal::from(*qty))
            .sum();
        prop_assert_eq!(quote.amount, expected);
        prop_assert!(quote.amount > Decimal::ZERO);
    }

    /// Property: merging never changes the total quantity per product and
    /// leaves each product once
    #[test]
    fn test_merge_conserves_quantity(
        picks in prop::collection::vec((0usize..4, 1i32..50), 1..20),
    ) {
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let lines: Vec<NewBookingLine> = picks
            .iter()
            .map(|(idx, qty)| NewBookingLine { product_id: ids[*idx], quantity: *qty })
            .collect();

        let merged = merge_lines(&lines);

        for id in &ids {
            let before: i32 = lines.iter().filter(|l| l.product_id == *id).map(|l| l.quantity).sum();
            let after: Vec<&NewBookingLine> = merged.iter().filter(|l| l.product_id == *id).collect();
            prop_assert!(after.len() <= 1);
            prop_assert_eq!(after.first().map(|l| l.quantity).unwrap_or(0), before);
        }
    }

    /// Property: an action succeeds exactly from its source status and lands
    /// on its target
    #[test]
    fn test_transition_table(status_idx in 0usize..5, action_idx in 0usize..4) {
        let status = all_statuses()[status_idx];
        let action = all_actions()[action_idx];

        match status.apply(action) {
            Ok(next) => {
                prop_assert_eq!(status, action.source());
                prop_assert_eq!(next, action.target());
            }
            Err(DomainError::InvalidTransition { .. }) => prop_assert_ne!(status, action.source()),
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    /// Property: terminal statuses accept no action
    #[test]
    fn test_terminal_accepts_nothing(action_idx in 0usize..4) {
        let action = all_actions()[action_idx];
        for status in all_statuses().into_iter().filter(BookingStatus::is_terminal) {
            prop_assert!(status.apply(action).is_err());
        }
    }
}

//! Stock arithmetic
//!
//! A product's stock is tracked as a net position split into two
//! non-negative halves: units physically on hand and units delivered beyond
//! what was on hand (backordered). The ledger records the full signed change
//! of every movement, so `on_hand - backordered` always equals the opening
//! stock plus the sum of ledger changes.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Current stock position of one product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StockLevel {
    pub on_hand: i32,
    pub backordered: i32,
}

impl StockLevel {
    /// Build a level from stored columns, normalising any overlap
    pub fn new(on_hand: i32, backordered: i32) -> Self {
        // Both halves are clamped to zero first, so the difference stays above i32::MIN
        let net = on_hand.max(0) - backordered.max(0);
        if net >= 0 {
            Self {
                on_hand: net,
                backordered: 0,
            }
        } else {
            Self {
                on_hand: 0,
                backordered: -net,
            }
        }
    }

    /// Build a level from a signed net position
    pub fn from_net(net: i32) -> DomainResult<Self> {
        if net >= 0 {
            return Ok(Self {
                on_hand: net,
                backordered: 0,
            });
        }
        let backordered = net.checked_neg().ok_or_else(out_of_range)?;
        Ok(Self {
            on_hand: 0,
            backordered,
        })
    }

    /// Net position: on hand minus backordered
    pub fn net(&self) -> i32 {
        self.on_hand - self.backordered
    }

    /// Apply a signed change. Positive changes pay back backorders first.
    ///
    /// Fails instead of saturating, so the level never drifts from the ledger.
    pub fn apply(self, delta: i32) -> DomainResult<Self> {
        let net = self.net().checked_add(delta).ok_or_else(out_of_range)?;
        Self::from_net(net)
    }

    pub fn is_backordered(&self) -> bool {
        self.backordered > 0
    }

    /// Units of `quantity` that cannot be covered by stock on hand
    pub fn shortfall(&self, quantity: i32) -> i32 {
        (quantity - self.on_hand).max(0)
    }
}

fn out_of_range() -> DomainError {
    DomainError::validation("quantity", "Stock change is out of range")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decrement_within_stock() {
        let level = StockLevel::new(5, 0).apply(-3).unwrap();
        assert_eq!(level, StockLevel::new(2, 0));
    }

    #[test]
    fn test_over_delivery_moves_deficit_to_backorder() {
        let level = StockLevel::new(2, 0).apply(-5).unwrap();
        assert_eq!(level.on_hand, 0);
        assert_eq!(level.backordered, 3);
        assert_eq!(level.net(), -3);
        assert!(level.is_backordered());
    }

    #[test]
    fn test_restock_pays_back_backorder_first() {
        let level = StockLevel::new(0, 3).apply(10).unwrap();
        assert_eq!(level, StockLevel::new(7, 0));

        let partial = StockLevel::new(0, 3).apply(2).unwrap();
        assert_eq!(partial, StockLevel::new(0, 1));
    }

    #[test]
    fn test_new_normalises_overlapping_columns() {
        let level = StockLevel::new(4, 1);
        assert_eq!(level.on_hand, 3);
        assert_eq!(level.backordered, 0);
    }

    #[test]
    fn test_shortfall() {
        let level = StockLevel::new(2, 0);
        assert_eq!(level.shortfall(1), 0);
        assert_eq!(level.shortfall(2), 0);
        assert_eq!(level.shortfall(5), 3);
    }

    #[test]
    fn test_overflow_is_refused() {
        assert!(matches!(
            StockLevel::new(0, 0).apply(i32::MIN),
            Err(DomainError::Validation { .. })
        ));
        assert!(StockLevel::new(i32::MAX, 0).apply(1).is_err());
        assert!(StockLevel::new(0, i32::MAX).apply(-1).is_err());
        assert!(StockLevel::from_net(i32::MIN).is_err());

        let floor = StockLevel::new(0, 0).apply(-i32::MAX).unwrap();
        assert_eq!(floor.net(), -i32::MAX);
    }
}

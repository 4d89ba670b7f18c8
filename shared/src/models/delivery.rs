//! Delivery models and delivery planning
//!
//! Planning is pure: given the booking's line items and the locked stock
//! levels of their products, it decides every stock movement and warning
//! before anything is written.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BookingAction, BookingLineItem, BookingStatus, Product};
use crate::error::{DomainError, DomainResult};
use crate::stock::StockLevel;

/// Outcome a storeman reports for an approved booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered,
    NotDelivered,
}

impl DeliveryStatus {
    pub fn action(&self) -> BookingAction {
        match self {
            DeliveryStatus::Delivered => BookingAction::MarkDelivered,
            DeliveryStatus::NotDelivered => BookingAction::MarkNotDelivered,
        }
    }

    pub fn booking_status(&self) -> BookingStatus {
        self.action().target()
    }
}

/// Courier details for a booking, one row per booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DeliveryDetails {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub delivery_company: Option<String>,
    pub tracking_number: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Storeman input for a delivery update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryUpdate {
    pub status: DeliveryStatus,
    pub delivery_company: Option<String>,
    pub tracking_number: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Non-fatal notice that a delivery took more than was on hand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryWarning {
    pub product_id: Uuid,
    pub product_name: String,
    pub requested: i32,
    pub available: i32,
}

/// What a delivery update is allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// `approved` booking moving to its delivery outcome
    Commit,
    /// Booking already carries the requested outcome; only details change
    Replay,
}

/// Decide how to handle a delivery update for a booking in `current`
pub fn delivery_mode(current: BookingStatus, requested: DeliveryStatus) -> DomainResult<DeliveryMode> {
    if current == BookingStatus::Approved {
        return Ok(DeliveryMode::Commit);
    }
    if current == requested.booking_status() {
        return Ok(DeliveryMode::Replay);
    }
    Err(DomainError::BookingNotReady { status: current })
}

/// One planned stock change for a delivered line item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMovement {
    pub product_id: Uuid,
    pub booking_item_id: Uuid,
    pub quantity: i32,
    pub before: StockLevel,
    pub after: StockLevel,
}

impl StockMovement {
    /// Signed ledger change for this movement
    pub fn quantity_change(&self) -> i32 {
        -self.quantity
    }
}

/// Every write a delivery commit will perform
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryPlan {
    pub movements: Vec<StockMovement>,
    pub warnings: Vec<InventoryWarning>,
}

impl DeliveryPlan {
    /// Final level of every touched product
    pub fn final_levels(&self) -> HashMap<Uuid, StockLevel> {
        self.movements
            .iter()
            .map(|m| (m.product_id, m.after))
            .collect()
    }
}

/// Plan the stock decrement for a delivered booking.
///
/// Lines are applied in order against a running level so several lines for
/// the same product see each other's effect. Over-delivery never blocks: the
/// deficit becomes a backorder and a warning is reported.
pub fn plan_delivery(
    items: &[BookingLineItem],
    products: &HashMap<Uuid, Product>,
) -> DomainResult<DeliveryPlan> {
    let mut levels: HashMap<Uuid, StockLevel> = HashMap::new();
    let mut plan = DeliveryPlan::default();

    for item in items {
        let product = products
            .get(&item.product_id)
            .ok_or(DomainError::ProductNotFound(item.product_id))?;
        let before = *levels
            .entry(product.id)
            .or_insert_with(|| product.stock_level());

        if before.shortfall(item.quantity) > 0 {
            plan.warnings.push(InventoryWarning {
                product_id: product.id,
                product_name: product.name.clone(),
                requested: item.quantity,
                available: before.on_hand,
            });
        }

        let after = before.apply(-item.quantity)?;
        levels.insert(product.id, after);
        plan.movements.push(StockMovement {
            product_id: product.id,
            booking_item_id: item.id,
            quantity: item.quantity,
            before,
            after,
        });
    }

    Ok(plan)
}

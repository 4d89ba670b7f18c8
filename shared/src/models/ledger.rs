//! Inventory ledger models
//!
//! The ledger is append-only. Every stock mutation writes exactly one entry
//! carrying the full signed change and where it came from.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Product;
use crate::error::{DomainError, DomainResult};

/// Reason for a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "inventory_transaction_type", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryType {
    /// Stock leaving with a delivered booking
    Delivery,
    /// Stock added by an approved permission request
    Restock,
    /// Manual correction in either direction
    Adjustment,
    /// Goods coming back from a customer
    Return,
}

impl LedgerEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerEntryType::Delivery => "delivery",
            LedgerEntryType::Restock => "restock",
            LedgerEntryType::Adjustment => "adjustment",
            LedgerEntryType::Return => "return",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "delivery" => Some(LedgerEntryType::Delivery),
            "restock" => Some(LedgerEntryType::Restock),
            "adjustment" => Some(LedgerEntryType::Adjustment),
            "return" => Some(LedgerEntryType::Return),
            _ => None,
        }
    }

    /// Check the sign of `quantity_change` against the entry type
    pub fn check_change(&self, quantity_change: i32) -> DomainResult<()> {
        let ok = match self {
            LedgerEntryType::Delivery => quantity_change < 0,
            LedgerEntryType::Restock | LedgerEntryType::Return => quantity_change > 0,
            LedgerEntryType::Adjustment => quantity_change != 0,
        };
        if ok {
            Ok(())
        } else {
            Err(DomainError::validation(
                "quantity_change",
                format!(
                    "{} entries cannot record a change of {}",
                    self.as_str(),
                    quantity_change
                ),
            ))
        }
    }

    /// Check that `provenance` is a legal source for this entry type
    pub fn check_provenance(&self, provenance: &Provenance) -> DomainResult<()> {
        let ok = matches!(
            (self, provenance),
            (LedgerEntryType::Delivery, Provenance::Booking(_))
                | (LedgerEntryType::Restock, Provenance::Request(_))
                | (LedgerEntryType::Return, Provenance::Booking(_))
                | (LedgerEntryType::Return, Provenance::Manual)
                | (LedgerEntryType::Adjustment, Provenance::Manual)
        );
        if ok {
            Ok(())
        } else {
            Err(DomainError::validation(
                "provenance",
                format!("{} entries cannot come from {:?}", self.as_str(), provenance),
            ))
        }
    }
}

/// What caused a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Provenance {
    Booking(Uuid),
    Request(Uuid),
    Manual,
}

impl Provenance {
    /// Rebuild from the two mutually exclusive storage columns
    pub fn from_columns(booking_id: Option<Uuid>, request_id: Option<Uuid>) -> Self {
        match (booking_id, request_id) {
            (Some(id), _) => Provenance::Booking(id),
            (None, Some(id)) => Provenance::Request(id),
            (None, None) => Provenance::Manual,
        }
    }

    pub fn booking_id(&self) -> Option<Uuid> {
        match self {
            Provenance::Booking(id) => Some(*id),
            _ => None,
        }
    }

    pub fn request_id(&self) -> Option<Uuid> {
        match self {
            Provenance::Request(id) => Some(*id),
            _ => None,
        }
    }
}

/// One ledger row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub product_id: Uuid,
    pub entry_type: LedgerEntryType,
    pub quantity_change: i32,
    pub provenance: Provenance,
    /// Line item that caused a delivery entry
    pub booking_item_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Entry about to be appended
#[derive(Debug, Clone, PartialEq)]
pub struct NewLedgerEntry {
    pub product_id: Uuid,
    pub entry_type: LedgerEntryType,
    pub quantity_change: i32,
    pub provenance: Provenance,
    pub booking_item_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_by: Uuid,
}

impl NewLedgerEntry {
    /// Enforce sign and provenance rules
    pub fn validate(&self) -> DomainResult<()> {
        self.entry_type.check_change(self.quantity_change)?;
        self.entry_type.check_provenance(&self.provenance)
    }
}

/// Ledger query filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerFilter {
    pub product_id: Option<Uuid>,
    pub entry_type: Option<LedgerEntryType>,
    pub booking_id: Option<Uuid>,
    pub request_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub limit: Option<i64>,
}

/// Totals per entry type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub entry_type: LedgerEntryType,
    pub count: i64,
    /// Sum of absolute changes
    pub total_quantity: i64,
}

/// Manual stock correction requested by staff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub product_id: Uuid,
    pub entry_type: LedgerEntryType,
    pub quantity_change: i32,
    /// Booking the goods came back from, for returns
    pub booking_id: Option<Uuid>,
    pub notes: Option<String>,
}

impl StockAdjustment {
    pub fn provenance(&self) -> Provenance {
        match self.booking_id {
            Some(id) => Provenance::Booking(id),
            None => Provenance::Manual,
        }
    }
}

/// Comparison of a product's stock against its ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub product_id: Uuid,
    pub opening_stock: i32,
    pub ledger_total: i64,
    /// `opening_stock + ledger_total`
    pub expected_net: i64,
    /// `stock_quantity - backorder_quantity`
    pub actual_net: i64,
    pub balanced: bool,
}

impl Reconciliation {
    pub fn compute(product: &Product, ledger_total: i64) -> Self {
        let expected_net = i64::from(product.opening_stock) + ledger_total;
        let actual_net =
            i64::from(product.stock_quantity) - i64::from(product.backorder_quantity);
        Self {
            product_id: product.id,
            opening_stock: product.opening_stock,
            ledger_total,
            expected_net,
            actual_net,
            balanced: expected_net == actual_net,
        }
    }
}

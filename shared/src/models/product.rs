//! Product catalog models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::stock::StockLevel;

/// A catalog product and its current stock position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: Uuid,
    /// Unique `<2-letter prefix><6 digits>` code
    pub code: String,
    /// Legacy SKU alias, also matched when looking products up by code
    pub sku: Option<String>,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub backorder_quantity: i32,
    /// Stock at catalog creation; the ledger explains every change after it
    pub opening_stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn stock_level(&self) -> StockLevel {
        StockLevel::new(self.stock_quantity, self.backorder_quantity)
    }

    pub fn is_backordered(&self) -> bool {
        self.backorder_quantity > 0
    }

    /// Whether `code` names this product, through either the code or the SKU alias
    pub fn matches_code(&self, code: &str) -> bool {
        self.code == code || self.sku.as_deref() == Some(code)
    }
}

/// Input for adding a product to the catalog directly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub code: Option<String>,
    pub sku: Option<String>,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub opening_stock: i32,
}

/// Catalog filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Matches name, code, SKU or description
    pub search: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub in_stock_only: bool,
}

/// Product categories and their code prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Electronics,
    Accessories,
    Beauty,
    Saree,
    Clothing,
    HomeGarden,
    Sports,
    Books,
    Toys,
    Jewelry,
    Shoes,
    Bags,
    Other,
}

/// Category lookup table: variant, display name, code prefix
const CATEGORY_TABLE: &[(ProductCategory, &str, &str)] = &[
    (ProductCategory::Electronics, "Electronics", "EC"),
    (ProductCategory::Accessories, "Accessories", "AC"),
    (ProductCategory::Beauty, "Beauty", "BP"),
    (ProductCategory::Saree, "Saree", "SR"),
    (ProductCategory::Clothing, "Clothing", "CL"),
    (ProductCategory::HomeGarden, "Home & Garden", "HG"),
    (ProductCategory::Sports, "Sports", "SP"),
    (ProductCategory::Books, "Books", "BK"),
    (ProductCategory::Toys, "Toys", "TY"),
    (ProductCategory::Jewelry, "Jewelry", "JW"),
    (ProductCategory::Shoes, "Shoes", "SH"),
    (ProductCategory::Bags, "Bags", "BG"),
    (ProductCategory::Other, "Other", "OT"),
];

impl ProductCategory {
    /// All categories in display order
    pub fn all() -> impl Iterator<Item = ProductCategory> {
        CATEGORY_TABLE.iter().map(|(category, _, _)| *category)
    }

    /// Resolve a free-text category name; unknown names map to `Other`
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        CATEGORY_TABLE
            .iter()
            .find(|(_, display, _)| display.eq_ignore_ascii_case(name))
            .map(|(category, _, _)| *category)
            .unwrap_or(ProductCategory::Other)
    }

    pub fn display_name(&self) -> &'static str {
        self.entry().1
    }

    /// Two-letter prefix used in product codes
    pub fn prefix(&self) -> &'static str {
        self.entry().2
    }

    fn entry(&self) -> &'static (ProductCategory, &'static str, &'static str) {
        CATEGORY_TABLE
            .iter()
            .find(|(category, _, _)| category == self)
            .unwrap_or(&CATEGORY_TABLE[CATEGORY_TABLE.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_prefixes() {
        assert_eq!(ProductCategory::from_name("Electronics").prefix(), "EC");
        assert_eq!(ProductCategory::from_name("home & garden").prefix(), "HG");
        assert_eq!(ProductCategory::from_name("  Saree ").prefix(), "SR");
    }

    #[test]
    fn test_unknown_category_defaults_to_other() {
        assert_eq!(ProductCategory::from_name("Groceries"), ProductCategory::Other);
        assert_eq!(ProductCategory::from_name("").prefix(), "OT");
    }

    #[test]
    fn test_every_category_has_unique_prefix() {
        let mut prefixes: Vec<_> = ProductCategory::all().map(|c| c.prefix()).collect();
        assert_eq!(prefixes.len(), 13);
        prefixes.sort();
        prefixes.dedup();
        assert_eq!(prefixes.len(), 13);
        assert!(prefixes
            .iter()
            .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_uppercase())));
    }
}

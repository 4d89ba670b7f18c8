//! Shared domain types and rules for the TrackIt inventory platform
//!
//! Everything in this crate is free of I/O: the booking and payment state
//! machines, booking pricing, stock arithmetic, delivery planning, ledger
//! provenance rules and product-code generation. The backend wraps these in
//! database transactions.

pub mod error;
pub mod models;
pub mod product_code;
pub mod stock;
pub mod types;
pub mod validation;

pub use error::*;
pub use models::*;
pub use product_code::*;
pub use stock::*;
pub use types::*;
pub use validation::*;

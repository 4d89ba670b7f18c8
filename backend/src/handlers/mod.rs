//! HTTP handlers
//!
//! Handlers validate the payload shape, then hand the authenticated actor and
//! the domain input to a service.

pub mod bookings;
pub mod deliveries;
pub mod health;
pub mod ledger;
pub mod payments;
pub mod permission_requests;
pub mod products;

pub use bookings::*;
pub use deliveries::*;
pub use health::*;
pub use ledger::*;
pub use payments::*;
pub use permission_requests::*;
pub use products::*;

use shared::Pagination;

/// Build pagination from optional query parameters
pub(crate) fn pagination(page: Option<u32>, per_page: Option<u32>) -> Pagination {
    let defaults = Pagination::default();
    Pagination {
        page: page.unwrap_or(defaults.page),
        per_page: per_page.unwrap_or(defaults.per_page),
    }
}

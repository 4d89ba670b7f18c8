//! Business logic services for the TrackIt inventory platform

pub mod booking;
pub mod customer;
pub mod delivery;
pub mod ledger;
pub mod payment;
pub mod permission_request;
pub mod product;

pub use booking::{BookingDetail, BookingService};
pub use customer::{CustomerHistory, CustomerService};
pub use delivery::{DeliveryOutcome, DeliveryService};
pub use ledger::{AdjustmentOutcome, LedgerService};
pub use payment::PaymentService;
pub use permission_request::{PermissionRequestService, ReviewOutcome, SubmittedRequest};
pub use product::ProductService;

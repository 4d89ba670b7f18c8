//! Domain models for the TrackIt inventory platform

mod actor;
mod booking;
mod delivery;
mod ledger;
mod payment;
mod permission_request;
mod product;

pub use actor::*;
pub use booking::*;
pub use delivery::*;
pub use ledger::*;
pub use payment::*;
pub use permission_request::*;
pub use product::*;

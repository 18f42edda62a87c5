//! Availability state machine.
//!
//! Per-property reservation-window lifecycle: a time-bounded soft lock
//! that counts down to automatic closure unless the property is reserved
//! first. State is in-memory and authoritative for the process lifetime;
//! it is rebuilt (empty) on restart, which fails safe because an absolute
//! expiry in the past closes the window immediately.

mod availability_model;
mod availability_service;
mod availability_store;


pub use availability_model::{PropertyAvailability, WindowPhase};
pub use availability_service::AvailabilityService;
pub use availability_store::AvailabilityStore;

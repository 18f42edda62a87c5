//! Bookstay Core - booking-lifecycle coordination for the Bookstay platform.
//!
//! This crate contains the real-time availability broadcaster (per-property
//! reservation-window countdowns with live visitor presence) and the
//! settlement ledger that splits, confirms, and reverses payments between
//! the platform fee and the property owner's balance.
//!
//! Persistence is abstracted behind the [`store::DocumentStore`] trait;
//! routing, authentication, and UI are external collaborators.

pub mod availability;
pub mod broadcast;
pub mod commands;
pub mod constants;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod presence;
pub mod properties;
#[cfg(feature = "ws")]
pub mod realtime;
pub mod store;

// Re-export common types
pub use events::{InboundCommand, OutboundEvent};

// Re-export error types
pub use errors::Error;
pub use errors::Result;

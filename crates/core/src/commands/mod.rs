//! Public command API.
//!
//! The single surface through which booking flows, admin actions, and the
//! realtime transport drive the presence registry, the availability state
//! machine, and the settlement ledger.

mod commands_service;

#[cfg(test)]
mod commands_service_tests;

pub use commands_service::CommandService;

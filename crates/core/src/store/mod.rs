//! Document store abstraction.
//!
//! The platform persists bookings, transactions, properties, and user
//! records in a managed document store. This module defines the
//! storage-agnostic contract plus an in-memory implementation used by
//! tests and single-process deployments.

mod memory_store;
mod store_traits;

pub use memory_store::MemoryDocumentStore;
pub use store_traits::{DocumentRef, DocumentStore, TransactFn};

//! Connection & presence registry.
//!
//! Tracks which connected client is interested in which property and
//! derives per-property live visitor counts from that interest.

mod presence_model;
mod presence_registry;

pub use presence_model::SubscriptionChange;
pub use presence_registry::PresenceRegistry;

//! Broadcast channel.
//!
//! Best-effort fan-out of wire events to the subscribers of one property.

mod broadcaster;

pub use broadcaster::Broadcaster;

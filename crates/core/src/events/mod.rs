//! Wire events module.
//!
//! Defines the message envelope exchanged with connected clients and the
//! sink trait through which the core delivers outbound events. Transport
//! adapters (WebSocket, tests) implement the sink.

mod sink;
mod wire_event;

pub use sink::*;
pub use wire_event::*;

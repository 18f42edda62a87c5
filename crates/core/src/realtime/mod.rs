//! Realtime transport.
//!
//! WebSocket glue between connected clients and the command API: one
//! socket maps to one registered connection, outbound events flow through
//! an unbounded channel, inbound text frames are decoded commands.

mod transport;

pub use transport::{realtime_router, start_server};

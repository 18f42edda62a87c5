//! Client sink trait and implementations.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use super::OutboundEvent;

/// Trait for delivering outbound events to one connected client.
///
/// Implementations translate events into transport writes.
///
/// # Design Rules
///
/// - `deliver()` must be fast and non-blocking (no awaits, no retries)
/// - A `false` return means the transport is not currently writable; the
///   caller skips the client silently (best-effort fan-out)
/// - Delivery failure must never fail the originating command
pub trait ClientSink: Send + Sync {
    /// Attempts to deliver one event. Returns false when the client's
    /// transport is no longer writable.
    fn deliver(&self, event: &OutboundEvent) -> bool;
}

/// Sink writing into an unbounded channel drained by the transport task.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OutboundEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<OutboundEvent>) -> Self {
        Self { tx }
    }
}

impl ClientSink for ChannelSink {
    fn deliver(&self, event: &OutboundEvent) -> bool {
        self.tx.send(event.clone()).is_ok()
    }
}

/// Sink for testing - collects delivered events.
#[derive(Clone)]
pub struct CollectingSink {
    events: Arc<Mutex<Vec<OutboundEvent>>>,
    writable: Arc<Mutex<bool>>,
}

impl Default for CollectingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectingSink {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            writable: Arc::new(Mutex::new(true)),
        }
    }

    /// Returns all collected events.
    pub fn events(&self) -> Vec<OutboundEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Returns the number of collected events.
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Returns true if no events have been collected.
    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }

    /// Clears collected events.
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Simulates a client whose transport stopped accepting writes.
    pub fn set_writable(&self, writable: bool) {
        *self.writable.lock().unwrap() = writable;
    }
}

impl ClientSink for CollectingSink {
    fn deliver(&self, event: &OutboundEvent) -> bool {
        if !*self.writable.lock().unwrap() {
            return false;
        }
        self.events.lock().unwrap().push(event.clone());
        true
    }
}

use std::sync::Arc;

use log::debug;

use crate::events::OutboundEvent;
use crate::presence::PresenceRegistry;

/// Fans events out to the subscribers of one property.
///
/// Delivery is synchronous within the broadcasting call and strictly topic
/// isolated: only connections whose recorded interest equals the property
/// receive the event. A subscriber whose transport is not writable is
/// skipped; there is no retry, buffering, or replay. Within one property,
/// events go out in the order the originating transitions occurred.
pub struct Broadcaster {
    registry: Arc<PresenceRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<PresenceRegistry>) -> Self {
        Self { registry }
    }

    /// Delivers `event` to every current subscriber of `property_id`.
    pub fn broadcast(&self, property_id: &str, event: &OutboundEvent) {
        let mut skipped = 0usize;
        for sink in self.registry.sinks_for(property_id) {
            if !sink.deliver(event) {
                skipped += 1;
            }
        }
        if skipped > 0 {
            debug!(
                "skipped {} unwritable subscriber(s) of property {}",
                skipped, property_id
            );
        }
    }

    /// Delivers `event` to a single connection (late-join snapshots, error
    /// replies). Failure is swallowed like any other delivery failure.
    pub fn send_to(&self, connection_id: &str, event: &OutboundEvent) {
        if let Some(sink) = self.registry.sink_of(connection_id) {
            if !sink.deliver(event) {
                debug!("connection {} not writable, event dropped", connection_id);
            }
        }
    }
}

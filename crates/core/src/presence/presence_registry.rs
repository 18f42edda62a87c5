use std::sync::Arc;

use dashmap::DashMap;
use log::debug;

use super::presence_model::{Connection, SubscriptionChange};
use crate::events::{ClientSink, OutboundEvent};

/// Registry of live connections and their property interest.
///
/// Owns two maps: connection id → (sink, interest) and property id →
/// visitor count. The count for a property always equals the number of
/// connections currently interested in it; every mutation here keeps the
/// two in step. Instances are independent, there is no process-wide state.
#[derive(Default)]
pub struct PresenceRegistry {
    connections: DashMap<String, Connection>,
    visitor_counts: DashMap<String, u32>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection and greets it.
    pub fn register(&self, connection_id: &str, sink: Arc<dyn ClientSink>) {
        let greeting = OutboundEvent::ConnectionEstablished {
            connection_id: connection_id.to_string(),
        };
        sink.deliver(&greeting);

        self.connections.insert(
            connection_id.to_string(),
            Connection {
                sink,
                interest: None,
            },
        );
        debug!("connection {} registered", connection_id);
    }

    /// Records interest in `property_id` for a connection.
    ///
    /// A connection holds at most one interest; re-subscribing moves the
    /// contribution from the previous property to the new one. The swap is
    /// performed under the connection's entry lock, so no property ever
    /// observes a double count for one connection.
    ///
    /// Returns None for an unregistered connection.
    pub fn subscribe(&self, connection_id: &str, property_id: &str) -> Option<SubscriptionChange> {
        let mut connection = self.connections.get_mut(connection_id)?;

        let previous = connection.interest.replace(property_id.to_string());
        match previous.as_deref() {
            Some(prev) if prev == property_id => {}
            Some(prev) => {
                self.decrement(prev);
                self.increment(property_id);
            }
            None => self.increment(property_id),
        }

        debug!(
            "connection {} now watching property {} (was {:?})",
            connection_id, property_id, previous
        );
        Some(SubscriptionChange { previous })
    }

    /// Clears a connection's interest. Idempotent: unknown connections and
    /// connections with no interest are no-ops.
    ///
    /// Returns the property the connection was interested in.
    pub fn unsubscribe(&self, connection_id: &str) -> Option<String> {
        let mut connection = self.connections.get_mut(connection_id)?;
        let previous = connection.interest.take();
        drop(connection);

        if let Some(prev) = &previous {
            self.decrement(prev);
        }
        previous
    }

    /// Removes a connection entirely (transport disconnect), releasing its
    /// presence contribution.
    ///
    /// Returns the property the connection was interested in.
    pub fn remove(&self, connection_id: &str) -> Option<String> {
        let (_, connection) = self.connections.remove(connection_id)?;
        if let Some(prev) = &connection.interest {
            self.decrement(prev);
        }
        debug!("connection {} removed", connection_id);
        connection.interest
    }

    /// Live visitor count for a property.
    pub fn visitor_count(&self, property_id: &str) -> u32 {
        self.visitor_counts
            .get(property_id)
            .map(|count| *count)
            .unwrap_or(0)
    }

    /// Sinks of every connection currently interested in `property_id`.
    pub fn sinks_for(&self, property_id: &str) -> Vec<Arc<dyn ClientSink>> {
        self.connections
            .iter()
            .filter(|entry| entry.interest.as_deref() == Some(property_id))
            .map(|entry| Arc::clone(&entry.sink))
            .collect()
    }

    /// Sink of one connection, if it is still registered.
    pub fn sink_of(&self, connection_id: &str) -> Option<Arc<dyn ClientSink>> {
        self.connections
            .get(connection_id)
            .map(|connection| Arc::clone(&connection.sink))
    }

    fn increment(&self, property_id: &str) {
        *self
            .visitor_counts
            .entry(property_id.to_string())
            .or_insert(0) += 1;
    }

    fn decrement(&self, property_id: &str) {
        if let Some(mut count) = self.visitor_counts.get_mut(property_id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                drop(count);
                self.visitor_counts
                    .remove_if(property_id, |_, count| *count == 0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingSink;

    fn register(registry: &PresenceRegistry, id: &str) -> CollectingSink {
        let sink = CollectingSink::new();
        registry.register(id, Arc::new(sink.clone()));
        sink
    }

    #[test]
    fn register_greets_the_connection() {
        let registry = PresenceRegistry::new();
        let sink = register(&registry, "c1");

        assert_eq!(
            sink.events(),
            vec![OutboundEvent::ConnectionEstablished {
                connection_id: "c1".to_string()
            }]
        );
    }

    #[test]
    fn visitor_count_tracks_interested_connections() {
        let registry = PresenceRegistry::new();
        register(&registry, "c1");
        register(&registry, "c2");
        register(&registry, "c3");

        registry.subscribe("c1", "p1");
        registry.subscribe("c2", "p1");
        registry.subscribe("c3", "p2");
        assert_eq!(registry.visitor_count("p1"), 2);
        assert_eq!(registry.visitor_count("p2"), 1);

        registry.unsubscribe("c1");
        assert_eq!(registry.visitor_count("p1"), 1);

        registry.remove("c2");
        assert_eq!(registry.visitor_count("p1"), 0);
        assert_eq!(registry.visitor_count("p2"), 1);
    }

    #[test]
    fn resubscribe_moves_the_contribution() {
        let registry = PresenceRegistry::new();
        register(&registry, "c1");

        registry.subscribe("c1", "p1");
        let change = registry.subscribe("c1", "p2").unwrap();

        assert_eq!(change.previous.as_deref(), Some("p1"));
        assert_eq!(registry.visitor_count("p1"), 0);
        assert_eq!(registry.visitor_count("p2"), 1);
    }

    #[test]
    fn resubscribe_to_same_property_is_stable() {
        let registry = PresenceRegistry::new();
        register(&registry, "c1");

        registry.subscribe("c1", "p1");
        registry.subscribe("c1", "p1");
        assert_eq!(registry.visitor_count("p1"), 1);
    }

    #[test]
    fn double_unsubscribe_is_a_no_op() {
        let registry = PresenceRegistry::new();
        register(&registry, "c1");

        registry.subscribe("c1", "p1");
        assert_eq!(registry.unsubscribe("c1").as_deref(), Some("p1"));
        assert_eq!(registry.unsubscribe("c1"), None);
        assert_eq!(registry.visitor_count("p1"), 0);

        // Unknown connections are equally harmless.
        assert_eq!(registry.unsubscribe("ghost"), None);
    }

    #[test]
    fn sinks_for_respects_topic_isolation() {
        let registry = PresenceRegistry::new();
        register(&registry, "c1");
        register(&registry, "c2");
        register(&registry, "c3");

        registry.subscribe("c1", "p1");
        registry.subscribe("c2", "p2");

        assert_eq!(registry.sinks_for("p1").len(), 1);
        assert_eq!(registry.sinks_for("p2").len(), 1);
        assert_eq!(registry.sinks_for("p3").len(), 0);
    }
}

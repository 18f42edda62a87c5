//! Wire event types.

use serde::{Deserialize, Serialize};

use crate::availability::PropertyAvailability;

/// Events pushed to connected clients.
///
/// Serialized as `{ "type": ..., "payload": ... }` with kebab-case type
/// tags. Availability updates always carry the full current snapshot;
/// subscribers replace their local copy wholesale rather than patching.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum OutboundEvent {
    /// Sent once when a connection registers.
    ConnectionEstablished { connection_id: String },

    /// Full availability snapshot for a property's reservation window.
    AvailabilityUpdate(PropertyAvailability),

    /// Live visitor count for a property changed.
    VisitorCountUpdate {
        property_id: String,
        visitor_count: u32,
    },

    /// A command from this connection was rejected.
    Error { message: String },
}

/// Commands accepted from connected clients and platform flows.
///
/// Same envelope as [`OutboundEvent`]. Messages that fail to decode are
/// answered with an `error` event, never dropped silently.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum InboundCommand {
    /// Register interest in a property's availability and visitor count.
    SubscribeProperty { property_id: String },

    /// Drop the connection's current interest.
    UnsubscribeProperty,

    /// Open a reservation window with a countdown (admin/business action).
    StartReservationWindow {
        property_id: String,
        duration_seconds: i64,
        total_slots: u32,
        available_slots: u32,
    },

    /// Close a property's window because a booking attempt succeeded.
    MarkPropertyReserved { property_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outbound_event_envelope_shape() {
        let event = OutboundEvent::VisitorCountUpdate {
            property_id: "p1".to_string(),
            visitor_count: 3,
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "visitor-count-update",
                "payload": {"propertyId": "p1", "visitorCount": 3}
            })
        );
    }

    #[test]
    fn inbound_command_decodes_from_envelope() {
        let raw = r#"{"type": "subscribe-property", "payload": {"propertyId": "p7"}}"#;
        let command: InboundCommand = serde_json::from_str(raw).unwrap();
        assert_eq!(
            command,
            InboundCommand::SubscribeProperty {
                property_id: "p7".to_string()
            }
        );
    }

    #[test]
    fn unknown_command_type_is_rejected() {
        let raw = r#"{"type": "drop-tables", "payload": {}}"#;
        assert!(serde_json::from_str::<InboundCommand>(raw).is_err());
    }
}

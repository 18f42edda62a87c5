use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use super::CommandService;
use crate::availability::{AvailabilityService, AvailabilityStore};
use crate::broadcast::Broadcaster;
use crate::events::{CollectingSink, OutboundEvent};
use crate::ledger::{LedgerRepository, LedgerService};
use crate::presence::PresenceRegistry;
use crate::properties::PropertyRepository;
use crate::store::{DocumentStore, MemoryDocumentStore};

struct Harness {
    availability: Arc<AvailabilityService>,
    service: CommandService,
}

async fn harness() -> Harness {
    let store = Arc::new(MemoryDocumentStore::new());
    store
        .set(
            "properties",
            "p1",
            json!({"id": "p1", "title": "Sea Loft", "ownerId": "o1"}),
        )
        .await
        .unwrap();

    let registry = Arc::new(PresenceRegistry::new());
    let broadcaster = Arc::new(Broadcaster::new(Arc::clone(&registry)));
    let availability = Arc::new(AvailabilityService::new(
        Arc::new(AvailabilityStore::new()),
        Arc::clone(&registry),
        Arc::clone(&broadcaster),
    ));
    let properties = PropertyRepository::new(store.clone() as Arc<dyn DocumentStore>);
    let ledger = Arc::new(LedgerService::new(
        LedgerRepository::new(store.clone() as Arc<dyn DocumentStore>),
        properties.clone(),
    ));

    let service = CommandService::new(
        registry,
        broadcaster,
        Arc::clone(&availability),
        ledger,
        properties,
    );
    Harness {
        availability,
        service,
    }
}

fn connect(harness: &Harness, connection_id: &str) -> CollectingSink {
    let sink = CollectingSink::new();
    harness.service.connect(connection_id, Arc::new(sink.clone()));
    sink.clear();
    sink
}

fn visitor_counts(sink: &CollectingSink) -> Vec<(String, u32)> {
    sink.events()
        .into_iter()
        .filter_map(|event| match event {
            OutboundEvent::VisitorCountUpdate {
                property_id,
                visitor_count,
            } => Some((property_id, visitor_count)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn subscribers_see_each_other_come_and_go() {
    let harness = harness().await;
    let first = connect(&harness, "c1");
    let second = connect(&harness, "c2");

    harness.service.subscribe_to_property("c1", "p1");
    harness.service.subscribe_to_property("c2", "p1");
    assert_eq!(
        visitor_counts(&first),
        vec![("p1".to_string(), 1), ("p1".to_string(), 2)]
    );
    assert_eq!(visitor_counts(&second), vec![("p1".to_string(), 2)]);

    harness.service.unsubscribe_from_property("c2");
    assert_eq!(visitor_counts(&first).last(), Some(&("p1".to_string(), 1)));
    // The leaver no longer receives p1 events.
    assert_eq!(visitor_counts(&second), vec![("p1".to_string(), 2)]);
}

#[tokio::test]
async fn switching_properties_updates_both_sides() {
    let harness = harness().await;
    let watcher = connect(&harness, "c1");
    connect(&harness, "c2");

    harness.service.subscribe_to_property("c1", "p1");
    harness.service.subscribe_to_property("c2", "p1");
    watcher.clear();

    harness.service.subscribe_to_property("c2", "p2");
    assert_eq!(visitor_counts(&watcher), vec![("p1".to_string(), 1)]);
}

#[tokio::test]
async fn disconnect_releases_presence() {
    let harness = harness().await;
    let watcher = connect(&harness, "c1");
    connect(&harness, "c2");

    harness.service.subscribe_to_property("c1", "p1");
    harness.service.subscribe_to_property("c2", "p1");
    watcher.clear();

    harness.service.disconnect("c2");
    assert_eq!(visitor_counts(&watcher), vec![("p1".to_string(), 1)]);
}

#[tokio::test]
async fn late_joiner_receives_the_current_snapshot() {
    let harness = harness().await;
    harness
        .service
        .start_reservation_window("p1", 900, 10, 10)
        .await
        .unwrap();

    let late = connect(&harness, "c9");
    harness.service.subscribe_to_property("c9", "p1");

    let snapshot = late.events().into_iter().find_map(|event| match event {
        OutboundEvent::AvailabilityUpdate(snapshot) => Some(snapshot),
        _ => None,
    });
    let snapshot = snapshot.expect("late joiner must get a snapshot");
    assert_eq!(snapshot.property_id, "p1");
    assert_eq!(snapshot.property_name, "Sea Loft");
    assert!(snapshot.is_available);
}

#[tokio::test]
async fn subscribing_without_a_window_replays_nothing() {
    let harness = harness().await;
    let sink = connect(&harness, "c1");

    harness.service.subscribe_to_property("c1", "p-unknown");

    assert!(sink
        .events()
        .iter()
        .all(|event| !matches!(event, OutboundEvent::AvailabilityUpdate(_))));
    assert!(harness.availability.snapshot("p-unknown").is_none());
}

#[tokio::test]
async fn window_for_an_unlisted_property_falls_back_to_the_id() {
    let harness = harness().await;
    harness
        .service
        .start_reservation_window("p-unlisted", 60, 2, 2)
        .await
        .unwrap();

    let snapshot = harness.availability.snapshot("p-unlisted").unwrap();
    assert_eq!(snapshot.property_name, "p-unlisted");
    assert!(snapshot.expiry_time.unwrap() > Utc::now());
}

#[tokio::test]
async fn unknown_wire_commands_are_answered_with_an_error() {
    let harness = harness().await;
    let sink = connect(&harness, "c1");
    let bystander = connect(&harness, "c2");

    harness
        .service
        .handle_message("c1", r#"{"type": "make-coffee", "payload": {}}"#)
        .await;
    harness.service.handle_message("c1", "not even json").await;

    let errors: Vec<_> = sink
        .events()
        .into_iter()
        .filter(|event| matches!(event, OutboundEvent::Error { .. }))
        .collect();
    assert_eq!(errors.len(), 2);
    assert!(bystander.is_empty());
}

#[tokio::test]
async fn wire_commands_drive_the_state_machine() {
    let harness = harness().await;
    let sink = connect(&harness, "c1");

    harness
        .service
        .handle_message("c1", r#"{"type": "subscribe-property", "payload": {"propertyId": "p1"}}"#)
        .await;
    harness
        .service
        .handle_message(
            "c1",
            r#"{"type": "start-reservation-window", "payload": {"propertyId": "p1", "durationSeconds": 300, "totalSlots": 5, "availableSlots": 5}}"#,
        )
        .await;
    harness
        .service
        .handle_message("c1", r#"{"type": "mark-property-reserved", "payload": {"propertyId": "p1"}}"#)
        .await;

    let snapshot = harness.availability.snapshot("p1").unwrap();
    assert!(!snapshot.is_available);
    assert_eq!(snapshot.available_slots, 0);

    let updates: Vec<bool> = sink
        .events()
        .into_iter()
        .filter_map(|event| match event {
            OutboundEvent::AvailabilityUpdate(snapshot) => Some(snapshot.is_available),
            _ => None,
        })
        .collect();
    assert_eq!(updates, vec![true, false]);
}

#[tokio::test]
async fn invalid_window_requests_are_rejected() {
    let harness = harness().await;
    let sink = connect(&harness, "c1");

    harness
        .service
        .handle_message(
            "c1",
            r#"{"type": "start-reservation-window", "payload": {"propertyId": "p1", "durationSeconds": 300, "totalSlots": 2, "availableSlots": 5}}"#,
        )
        .await;

    assert!(sink
        .events()
        .iter()
        .any(|event| matches!(event, OutboundEvent::Error { .. })));
    assert!(harness.availability.snapshot("p1").is_none());
}

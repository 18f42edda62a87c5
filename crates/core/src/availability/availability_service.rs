use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info};

use super::availability_model::{PropertyAvailability, WindowPhase, WindowRecord};
use super::availability_store::AvailabilityStore;
use crate::broadcast::Broadcaster;
use crate::events::OutboundEvent;
use crate::presence::PresenceRegistry;

/// Drives per-property reservation windows.
///
/// States: open (no record), countdown (available, expiry set, timer
/// pending), closed (terminal until a new countdown). Every transition
/// that mutates a record broadcasts the full current snapshot.
///
/// Timers are never cancelled. Each countdown bumps the record's
/// generation; a firing timer applies only while the record is still in
/// countdown with that generation, so superseded timers fall through as
/// silent no-ops and races with `mark_reserved` converge on closed.
pub struct AvailabilityService {
    store: Arc<AvailabilityStore>,
    registry: Arc<PresenceRegistry>,
    broadcaster: Arc<Broadcaster>,
}

impl AvailabilityService {
    pub fn new(
        store: Arc<AvailabilityStore>,
        registry: Arc<PresenceRegistry>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            store,
            registry,
            broadcaster,
        }
    }

    /// Opens a reservation window holding `available_slots` of
    /// `total_slots` until `expiry_time`.
    ///
    /// Valid from open or closed; overwrites any previous window. An
    /// expiry at or before now short-circuits straight to closed with no
    /// timer (this is also how windows that were pending across a process
    /// restart resolve).
    pub fn start_countdown(
        &self,
        property_id: &str,
        property_name: &str,
        expiry_time: DateTime<Utc>,
        total_slots: u32,
        available_slots: u32,
    ) {
        let now = Utc::now();
        let generation = self.store.next_generation(property_id);
        let expired = expiry_time <= now;

        let snapshot = PropertyAvailability {
            property_id: property_id.to_string(),
            property_name: property_name.to_string(),
            is_available: !expired,
            expiry_time: Some(expiry_time),
            active_visitors: self.registry.visitor_count(property_id),
            total_slots,
            available_slots,
        };
        self.store.put(WindowRecord {
            snapshot: snapshot.clone(),
            phase: if expired {
                WindowPhase::Closed
            } else {
                WindowPhase::Countdown
            },
            generation,
        });

        if expired {
            info!(
                "reservation window for property {} expired on arrival",
                property_id
            );
        } else {
            info!(
                "reservation window for property {} open until {}",
                property_id, expiry_time
            );
            self.schedule_expiry(property_id, generation, expiry_time, now);
        }

        self.broadcaster
            .broadcast(property_id, &OutboundEvent::AvailabilityUpdate(snapshot));
    }

    /// Closes a property's window because a booking succeeded.
    ///
    /// Valid from any state: forces the window closed with zero available
    /// slots, independent of any pending timer. Reserving a property that
    /// never had a window still materializes a closed record so
    /// subscribers learn the property is gone.
    pub fn mark_reserved(&self, property_id: &str) {
        let closed = self.store.mutate(property_id, |record| {
            record.phase = WindowPhase::Closed;
            record.snapshot.is_available = false;
            record.snapshot.available_slots = 0;
            true
        });

        let snapshot = match closed {
            Some(snapshot) => snapshot,
            None => {
                let snapshot = PropertyAvailability {
                    property_id: property_id.to_string(),
                    property_name: property_id.to_string(),
                    is_available: false,
                    expiry_time: None,
                    active_visitors: self.registry.visitor_count(property_id),
                    total_slots: 0,
                    available_slots: 0,
                };
                self.store.put(WindowRecord {
                    snapshot: snapshot.clone(),
                    phase: WindowPhase::Closed,
                    generation: self.store.next_generation(property_id),
                });
                snapshot
            }
        };

        info!("property {} marked reserved", property_id);
        self.broadcaster
            .broadcast(property_id, &OutboundEvent::AvailabilityUpdate(snapshot));
    }

    /// Syncs a window's visitor mirror with the presence registry.
    ///
    /// Called by the command layer on every presence change so the stored
    /// count is current before the next availability broadcast. No-op for
    /// properties without a window.
    pub fn refresh_visitors(&self, property_id: &str) {
        let visitors = self.registry.visitor_count(property_id);
        self.store.mutate(property_id, |record| {
            record.snapshot.active_visitors = visitors;
            true
        });
    }

    /// Latest snapshot for late-join replay.
    pub fn snapshot(&self, property_id: &str) -> Option<PropertyAvailability> {
        self.store.snapshot(property_id)
    }

    fn schedule_expiry(
        &self,
        property_id: &str,
        generation: u64,
        expiry_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) {
        let delay = (expiry_time - now).to_std().unwrap_or_default();
        let store = Arc::clone(&self.store);
        let broadcaster = Arc::clone(&self.broadcaster);
        let property_id = property_id.to_string();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            Self::handle_expiry(&store, &broadcaster, &property_id, generation);
        });
    }

    /// Applies a timer expiry. Re-checks the record before mutating: only
    /// a countdown still carrying this timer's generation closes; anything
    /// else means the timer was superseded.
    fn handle_expiry(
        store: &AvailabilityStore,
        broadcaster: &Broadcaster,
        property_id: &str,
        generation: u64,
    ) {
        let closed = store.mutate(property_id, |record| {
            if record.phase != WindowPhase::Countdown || record.generation != generation {
                return false;
            }
            record.phase = WindowPhase::Closed;
            record.snapshot.is_available = false;
            true
        });

        match closed {
            Some(snapshot) => {
                info!("reservation window for property {} expired", property_id);
                broadcaster.broadcast(property_id, &OutboundEvent::AvailabilityUpdate(snapshot));
            }
            None => debug!(
                "stale expiry timer for property {} ignored",
                property_id
            ),
        }
    }
}

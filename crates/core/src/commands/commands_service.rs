use std::sync::Arc;

use chrono::Utc;
use log::{debug, warn};
use rust_decimal::Decimal;

use crate::availability::AvailabilityService;
use crate::broadcast::Broadcaster;
use crate::errors::{Error, Result, ValidationError};
use crate::events::{ClientSink, InboundCommand, OutboundEvent};
use crate::ledger::{LedgerServiceTrait, PaymentMethod};
use crate::presence::PresenceRegistry;
use crate::properties::PropertyRepository;

/// Orchestrates the coordination core.
///
/// Presence changes, window commands, and ledger operations all enter
/// here; the service keeps the visitor mirror and the broadcasts
/// consistent across the underlying components.
pub struct CommandService {
    registry: Arc<PresenceRegistry>,
    broadcaster: Arc<Broadcaster>,
    availability: Arc<AvailabilityService>,
    ledger: Arc<dyn LedgerServiceTrait>,
    properties: PropertyRepository,
}

impl CommandService {
    pub fn new(
        registry: Arc<PresenceRegistry>,
        broadcaster: Arc<Broadcaster>,
        availability: Arc<AvailabilityService>,
        ledger: Arc<dyn LedgerServiceTrait>,
        properties: PropertyRepository,
    ) -> Self {
        Self {
            registry,
            broadcaster,
            availability,
            ledger,
            properties,
        }
    }

    /// Registers a freshly connected client.
    pub fn connect(&self, connection_id: &str, sink: Arc<dyn ClientSink>) {
        self.registry.register(connection_id, sink);
    }

    /// Transport hook for a dropped connection: releases its presence
    /// contribution and its sink.
    pub fn disconnect(&self, connection_id: &str) {
        if let Some(previous) = self.registry.remove(connection_id) {
            self.publish_presence_change(&previous);
        }
    }

    /// Subscribes a connection to a property.
    ///
    /// Publishes visitor counts for the property left (if any) and the one
    /// joined, and replays the latest availability snapshot to the caller
    /// when a reservation window is live (late-join consistency).
    pub fn subscribe_to_property(&self, connection_id: &str, property_id: &str) {
        let Some(change) = self.registry.subscribe(connection_id, property_id) else {
            warn!("subscribe from unregistered connection {}", connection_id);
            return;
        };

        match change.previous.as_deref() {
            Some(previous) if previous != property_id => {
                self.publish_presence_change(previous);
                self.publish_presence_change(property_id);
            }
            Some(_) => {}
            None => self.publish_presence_change(property_id),
        }

        if let Some(snapshot) = self.availability.snapshot(property_id) {
            self.broadcaster
                .send_to(connection_id, &OutboundEvent::AvailabilityUpdate(snapshot));
        }
    }

    /// Drops a connection's interest, keeping the left property's counts
    /// and subscribers up to date. Idempotent.
    pub fn unsubscribe_from_property(&self, connection_id: &str) {
        if let Some(previous) = self.registry.unsubscribe(connection_id) {
            self.publish_presence_change(&previous);
        }
    }

    /// Opens a reservation window for `duration_seconds` from now
    /// (admin/business action).
    pub async fn start_reservation_window(
        &self,
        property_id: &str,
        duration_seconds: i64,
        total_slots: u32,
        available_slots: u32,
    ) -> Result<()> {
        if available_slots > total_slots {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "available slots {} exceed total slots {}",
                available_slots, total_slots
            ))));
        }

        // Unknown properties still get a window (the id doubles as the
        // display name); listings are owned by an external CRUD surface
        // and may lag.
        let property_name = self
            .properties
            .find_by_id(property_id)
            .await?
            .map(|property| property.title)
            .unwrap_or_else(|| property_id.to_string());

        let expiry_time = Utc::now() + chrono::Duration::seconds(duration_seconds);
        self.availability.start_countdown(
            property_id,
            &property_name,
            expiry_time,
            total_slots,
            available_slots,
        );
        Ok(())
    }

    /// Closes a property's window because a booking attempt succeeded.
    pub fn mark_property_reserved(&self, property_id: &str) {
        self.availability.mark_reserved(property_id);
    }

    /// Records a captured payment for a booking. Returns the transaction id.
    pub async fn process_payment(
        &self,
        booking_id: &str,
        amount: Decimal,
        payment_method: PaymentMethod,
    ) -> Result<String> {
        self.ledger
            .process_payment(booking_id, amount, payment_method)
            .await
    }

    /// Completes a pending (cash-on-arrival) transaction.
    pub async fn confirm_pending_transaction(&self, transaction_id: &str) -> Result<()> {
        self.ledger.confirm_pending(transaction_id).await
    }

    /// Refunds a transaction and cancels its booking.
    pub async fn refund_transaction(&self, transaction_id: &str, reason: &str) -> Result<()> {
        self.ledger.refund(transaction_id, reason).await
    }

    /// Decodes and dispatches one raw wire message from a connection.
    ///
    /// Malformed payloads and unknown command types are answered with an
    /// `error` event on the same connection, never dropped silently.
    pub async fn handle_message(&self, connection_id: &str, raw: &str) {
        let command = match serde_json::from_str::<InboundCommand>(raw) {
            Ok(command) => command,
            Err(err) => {
                debug!("connection {} sent undecodable command: {}", connection_id, err);
                self.send_error(connection_id, &format!("unrecognized command: {}", err));
                return;
            }
        };

        match command {
            InboundCommand::SubscribeProperty { property_id } => {
                self.subscribe_to_property(connection_id, &property_id);
            }
            InboundCommand::UnsubscribeProperty => {
                self.unsubscribe_from_property(connection_id);
            }
            InboundCommand::StartReservationWindow {
                property_id,
                duration_seconds,
                total_slots,
                available_slots,
            } => {
                if let Err(err) = self
                    .start_reservation_window(
                        &property_id,
                        duration_seconds,
                        total_slots,
                        available_slots,
                    )
                    .await
                {
                    self.report_failure(connection_id, &property_id, &err);
                }
            }
            InboundCommand::MarkPropertyReserved { property_id } => {
                self.mark_property_reserved(&property_id);
            }
        }
    }

    /// Publishes the new visitor count for a property and syncs the
    /// availability mirror so the count is current before the next
    /// availability broadcast.
    fn publish_presence_change(&self, property_id: &str) {
        self.availability.refresh_visitors(property_id);
        self.broadcaster.broadcast(
            property_id,
            &OutboundEvent::VisitorCountUpdate {
                property_id: property_id.to_string(),
                visitor_count: self.registry.visitor_count(property_id),
            },
        );
    }

    /// Answers a failed command with an `error` event. Transient upstream
    /// faults are worth a retry and an operator's attention; everything
    /// else is a caller mistake.
    fn report_failure(&self, connection_id: &str, property_id: &str, err: &Error) {
        if err.is_retryable() {
            warn!("command for property {} failed upstream: {}", property_id, err);
        } else {
            debug!("command for property {} rejected: {}", property_id, err);
        }
        self.send_error(connection_id, &err.to_string());
    }

    fn send_error(&self, connection_id: &str, message: &str) {
        self.broadcaster.send_to(
            connection_id,
            &OutboundEvent::Error {
                message: message.to_string(),
            },
        );
    }
}

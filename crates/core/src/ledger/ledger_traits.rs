//! Ledger service trait.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::ledger_model::PaymentMethod;
use crate::errors::Result;

/// Trait defining the contract for settlement ledger operations.
///
/// Booking and admin flows drive the ledger exclusively through this
/// surface; the implementations own all status transitions and the atomic
/// owner-balance updates.
#[async_trait]
pub trait LedgerServiceTrait: Send + Sync {
    /// Splits and records a captured payment for a booking.
    ///
    /// Cash-on-arrival payments are held pending (the owner is credited on
    /// confirmation); everything else completes and credits immediately.
    /// Returns the new transaction id.
    async fn process_payment(
        &self,
        booking_id: &str,
        amount: Decimal,
        payment_method: PaymentMethod,
    ) -> Result<String>;

    /// Completes a pending transaction and credits the owner in the same
    /// atomic step. Fails with `StateConflict` unless the transaction is
    /// pending.
    async fn confirm_pending(&self, transaction_id: &str) -> Result<()>;

    /// Refunds a transaction and cancels its booking. Reverses the owner
    /// credit only when the transaction had completed. Fails with
    /// `StateConflict` when already refunded.
    async fn refund(&self, transaction_id: &str, reason: &str) -> Result<()>;
}

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use rust_decimal::Decimal;

use super::ledger_model::{
    split_amount, BookingStatus, OwnerFinancials, PaymentMethod, Transaction, TransactionStatus,
};
use super::ledger_repository::{LedgerRepository, SettlementTransition};
use super::ledger_traits::LedgerServiceTrait;
use crate::errors::{Error, Result, ValidationError};
use crate::properties::PropertyRepository;

/// Service implementing the settlement ledger.
///
/// Every operation commits its status transition, booking update, and
/// owner-balance change as one store transaction: when any step fails,
/// nothing advances and a retry starts from the prior state. Amounts on a
/// transaction row are immutable after creation, so credit and reversal
/// figures can be computed from a read that precedes the commit.
pub struct LedgerService {
    repository: LedgerRepository,
    properties: PropertyRepository,
}

impl LedgerService {
    pub fn new(repository: LedgerRepository, properties: PropertyRepository) -> Self {
        Self {
            repository,
            properties,
        }
    }
}

#[async_trait]
impl LedgerServiceTrait for LedgerService {
    async fn process_payment(
        &self,
        booking_id: &str,
        amount: Decimal,
        payment_method: PaymentMethod,
    ) -> Result<String> {
        if amount <= Decimal::ZERO {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "payment amount must be positive, got {}",
                amount
            ))));
        }

        // Validation reads come first; nothing is written until both the
        // booking and its property resolve.
        let booking = self.repository.get_booking(booking_id).await?;
        let property = self.properties.get_by_id(&booking.property_id).await?;

        let (platform_fee, owner_amount) = split_amount(amount);
        let (status, booking_status) = match payment_method {
            PaymentMethod::CashOnArrival => (TransactionStatus::Pending, BookingStatus::Pending),
            _ => (TransactionStatus::Completed, BookingStatus::Confirmed),
        };

        let now = Utc::now();
        let transaction = Transaction {
            id: uuid::Uuid::new_v4().to_string(),
            booking_id: booking_id.to_string(),
            property_id: booking.property_id.clone(),
            owner_id: property.owner_id.clone(),
            user_id: booking.customer_id.clone(),
            amount,
            platform_fee,
            owner_amount,
            payment_method,
            status,
            refund_reason: None,
            created_at: now,
            updated_at: now,
        };
        debug!(
            "processing payment of {} for booking {} ({:?})",
            amount, booking_id, payment_method
        );

        let credit = credit_of(amount, platform_fee);
        self.repository
            .record_payment(
                &transaction,
                booking_status,
                if status == TransactionStatus::Completed {
                    Some(&credit)
                } else {
                    None
                },
            )
            .await?;

        info!(
            "payment {} recorded for booking {} as {:?}",
            transaction.id, booking_id, status
        );
        Ok(transaction.id)
    }

    async fn confirm_pending(&self, transaction_id: &str) -> Result<()> {
        let row = self.repository.get_transaction(transaction_id).await?;
        let credit = credit_of(row.amount, row.platform_fee);

        let prior = self
            .repository
            .transition_settlement(
                transaction_id,
                SettlementTransition {
                    allowed: &[TransactionStatus::Pending],
                    next: TransactionStatus::Completed,
                    refund_reason: None,
                    booking_status: BookingStatus::Confirmed,
                    payment_id: Some(transaction_id),
                    adjust: Some(&credit),
                    adjust_when: &[TransactionStatus::Pending],
                },
            )
            .await?;

        info!(
            "transaction {} confirmed, owner {} credited {}",
            transaction_id, prior.owner_id, prior.amount
        );
        Ok(())
    }

    async fn refund(&self, transaction_id: &str, reason: &str) -> Result<()> {
        let row = self.repository.get_transaction(transaction_id).await?;
        let revert = revert_of(row.amount, row.platform_fee);

        // A pending transaction never credited the owner, so only a prior
        // completed status triggers the reversal. The decision is made on
        // the status read inside the commit, not the one read above.
        let prior = self
            .repository
            .transition_settlement(
                transaction_id,
                SettlementTransition {
                    allowed: &[TransactionStatus::Pending, TransactionStatus::Completed],
                    next: TransactionStatus::Refunded,
                    refund_reason: Some(reason.to_string()),
                    booking_status: BookingStatus::Cancelled,
                    payment_id: None,
                    adjust: Some(&revert),
                    adjust_when: &[TransactionStatus::Completed],
                },
            )
            .await?;

        info!(
            "transaction {} refunded ({}), booking {} cancelled",
            transaction_id, reason, prior.booking_id
        );
        Ok(())
    }
}

fn credit_of(
    amount: Decimal,
    platform_fee: Decimal,
) -> impl Fn(&mut OwnerFinancials) + Send + Sync {
    move |financials| {
        financials.total_earnings += amount;
        financials.total_platform_fees += platform_fee;
        financials.available_balance += amount;
        financials.total_bookings += 1;
    }
}

fn revert_of(
    amount: Decimal,
    platform_fee: Decimal,
) -> impl Fn(&mut OwnerFinancials) + Send + Sync {
    // Each field clamps to zero independently; see DESIGN.md for the
    // known aggregate-consistency gap this preserves.
    move |financials| {
        financials.total_earnings = (financials.total_earnings - amount).max(Decimal::ZERO);
        financials.total_platform_fees =
            (financials.total_platform_fees - platform_fee).max(Decimal::ZERO);
        financials.available_balance = (financials.available_balance - amount).max(Decimal::ZERO);
        financials.total_bookings = financials.total_bookings.saturating_sub(1);
    }
}

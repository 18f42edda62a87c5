use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::constants::{MONEY_DECIMAL_PRECISION, PLATFORM_FEE_RATE};

/// How a booking was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
    /// Settles on arrival; credited to the owner only on confirmation.
    CashOnArrival,
}

/// Lifecycle status of a settlement transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Refunded,
}

/// Lifecycle status of a booking. Driven exclusively by ledger operations
/// or explicit admin action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

/// One settlement ledger entry. Created once per payment split; refunds
/// flip `status` instead of removing the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub booking_id: String,
    pub property_id: String,
    pub owner_id: String,
    pub user_id: String,
    pub amount: Decimal,
    pub platform_fee: Decimal,
    pub owner_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub status: TransactionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stay booked by a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub property_id: String,
    pub customer_id: String,
    pub status: BookingStatus,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
}

/// Running balances embedded on the owner's user record.
///
/// Mutated only inside the store's atomic transact; reversal clamps every
/// field to zero independently, so no field ever goes negative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OwnerFinancials {
    pub total_earnings: Decimal,
    pub total_platform_fees: Decimal,
    pub available_balance: Decimal,
    pub total_bookings: u32,
}

/// Splits a payment into the platform fee and the owner amount.
///
/// The fee is 10% rounded to minor units; the owner amount is the exact
/// remainder, so the two always sum back to `amount`.
pub fn split_amount(amount: Decimal) -> (Decimal, Decimal) {
    let platform_fee = (amount * PLATFORM_FEE_RATE)
        .round_dp_with_strategy(MONEY_DECIMAL_PRECISION, RoundingStrategy::MidpointAwayFromZero);
    let owner_amount = amount - platform_fee;
    (platform_fee, owner_amount)
}

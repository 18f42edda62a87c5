//! Settlement ledger.
//!
//! Append-only record of payment transactions plus the derived running
//! balances per owner. Every payment is split between the fixed platform
//! fee and the owner amount; confirmation and refund transition the
//! transaction row (never delete it), update its booking, and adjust the
//! owner's financials in one atomic store commit.

mod ledger_model;
mod ledger_repository;
mod ledger_service;
mod ledger_traits;


pub use ledger_model::{
    split_amount, Booking, BookingStatus, OwnerFinancials, PaymentMethod, Transaction,
    TransactionStatus,
};
pub use ledger_repository::{FinancialsFn, LedgerRepository, SettlementTransition};
pub use ledger_service::LedgerService;
pub use ledger_traits::LedgerServiceTrait;

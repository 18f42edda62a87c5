use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::{json, Value};

use super::ledger_model::{Booking, BookingStatus, OwnerFinancials, Transaction, TransactionStatus};
use crate::constants::{BOOKINGS_COLLECTION, TRANSACTIONS_COLLECTION, USERS_COLLECTION};
use crate::errors::{Error, Result};
use crate::store::{DocumentRef, DocumentStore};

/// Owner-balance mutation applied inside a settlement transaction.
pub type FinancialsFn<'a> = &'a (dyn Fn(&mut OwnerFinancials) + Send + Sync);

/// Describes an atomic settlement transition applied by
/// [`LedgerRepository::transition_settlement`].
pub struct SettlementTransition<'a> {
    /// Statuses the row may currently be in; anything else is a
    /// `StateConflict` and nothing is written.
    pub allowed: &'a [TransactionStatus],
    pub next: TransactionStatus,
    pub refund_reason: Option<String>,
    pub booking_status: BookingStatus,
    /// Payment reference written onto the booking, when present.
    pub payment_id: Option<&'a str>,
    /// Owner-balance change, applied only when the prior status is in
    /// `adjust_when`.
    pub adjust: Option<FinancialsFn<'a>>,
    pub adjust_when: &'a [TransactionStatus],
}

/// Typed persistence for ledger entities over the document store.
///
/// Carries no business rules, but each settlement operation runs as one
/// store transaction spanning the transaction row, its booking, and the
/// owner's user record: when any step fails, none of them advance and a
/// retry starts from the prior state.
#[derive(Clone)]
pub struct LedgerRepository {
    store: Arc<dyn DocumentStore>,
}

impl LedgerRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get_booking(&self, booking_id: &str) -> Result<Booking> {
        let doc = self
            .store
            .get(BOOKINGS_COLLECTION, booking_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("booking {}", booking_id)))?;
        serde_json::from_value(doc).map_err(Into::into)
    }

    pub async fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        let doc = self
            .store
            .get(TRANSACTIONS_COLLECTION, transaction_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("transaction {}", transaction_id)))?;
        serde_json::from_value(doc).map_err(Into::into)
    }

    /// Writes a new transaction row, its booking's status and payment
    /// reference, and an optional owner credit as one atomic commit.
    pub async fn record_payment(
        &self,
        transaction: &Transaction,
        booking_status: BookingStatus,
        credit: Option<FinancialsFn<'_>>,
    ) -> Result<()> {
        let mut refs = vec![
            DocumentRef::new(TRANSACTIONS_COLLECTION, &transaction.id),
            DocumentRef::new(BOOKINGS_COLLECTION, &transaction.booking_id),
        ];
        if credit.is_some() {
            refs.push(DocumentRef::new(USERS_COLLECTION, &transaction.owner_id));
        }
        let row = serde_json::to_value(transaction)?;

        self.store
            .transact(&refs, &|drafts| {
                drafts[0] = Some(row.clone());

                let booking = drafts[1].as_mut().ok_or_else(|| {
                    Error::NotFound(format!("booking {}", transaction.booking_id))
                })?;
                merge_fields(
                    booking,
                    &json!({ "status": booking_status, "paymentId": transaction.id }),
                )?;

                if let Some(apply) = credit {
                    let owner = drafts[2].as_mut().ok_or_else(|| {
                        Error::NotFound(format!("owner {}", transaction.owner_id))
                    })?;
                    apply_financials(owner, &transaction.owner_id, apply)?;
                }
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Atomically moves a transaction out of its current status, updates
    /// its booking, and applies the owner-balance adjustment, all in one
    /// commit. Returns the row as it was before the transition.
    ///
    /// The status check runs inside the store transaction, so of two racing
    /// transitions at most one succeeds. The related document ids are read
    /// upfront; a row's booking and owner never change after creation.
    pub async fn transition_settlement(
        &self,
        transaction_id: &str,
        transition: SettlementTransition<'_>,
    ) -> Result<Transaction> {
        let row = self.get_transaction(transaction_id).await?;
        let refs = [
            DocumentRef::new(TRANSACTIONS_COLLECTION, transaction_id),
            DocumentRef::new(BOOKINGS_COLLECTION, &row.booking_id),
            DocumentRef::new(USERS_COLLECTION, &row.owner_id),
        ];

        let prior: Mutex<Option<Transaction>> = Mutex::new(None);
        self.store
            .transact(&refs, &|drafts| {
                let current: Transaction = match &drafts[0] {
                    Some(doc) => serde_json::from_value(doc.clone())?,
                    None => {
                        return Err(Error::NotFound(format!("transaction {}", transaction_id)))
                    }
                };
                if !transition.allowed.contains(&current.status) {
                    return Err(Error::StateConflict(format!(
                        "transaction {} is {:?}, cannot transition to {:?}",
                        transaction_id, current.status, transition.next
                    )));
                }

                let mut updated = current.clone();
                updated.status = transition.next;
                if transition.refund_reason.is_some() {
                    updated.refund_reason = transition.refund_reason.clone();
                }
                updated.updated_at = Utc::now();
                drafts[0] = Some(serde_json::to_value(&updated)?);

                let booking = drafts[1]
                    .as_mut()
                    .ok_or_else(|| Error::NotFound(format!("booking {}", current.booking_id)))?;
                let mut changes = json!({ "status": transition.booking_status });
                if let Some(payment_id) = transition.payment_id {
                    changes["paymentId"] = json!(payment_id);
                }
                merge_fields(booking, &changes)?;

                if let Some(apply) = transition.adjust {
                    if transition.adjust_when.contains(&current.status) {
                        let owner = drafts[2]
                            .as_mut()
                            .ok_or_else(|| Error::NotFound(format!("owner {}", current.owner_id)))?;
                        apply_financials(owner, &current.owner_id, apply)?;
                    }
                }

                if let Ok(mut slot) = prior.lock() {
                    *slot = Some(current);
                }
                Ok(())
            })
            .await?;

        prior
            .into_inner()
            .ok()
            .flatten()
            .ok_or_else(|| Error::Upstream("committed transaction state unavailable".to_string()))
    }
}

fn merge_fields(doc: &mut Value, changes: &Value) -> Result<()> {
    match (doc.as_object_mut(), changes.as_object()) {
        (Some(fields), Some(changes)) => {
            for (field, value) in changes {
                fields.insert(field.clone(), value.clone());
            }
            Ok(())
        }
        _ => Err(Error::Upstream("merge update on non-object document".to_string())),
    }
}

fn apply_financials(doc: &mut Value, owner_id: &str, apply: FinancialsFn<'_>) -> Result<()> {
    let fields = doc
        .as_object_mut()
        .ok_or_else(|| Error::Upstream(format!("user record {} is not an object", owner_id)))?;

    let mut financials: OwnerFinancials = match fields.get("financials") {
        Some(value) => serde_json::from_value(value.clone())?,
        None => OwnerFinancials::default(),
    };
    apply(&mut financials);
    fields.insert("financials".to_string(), serde_json::to_value(&financials)?);
    Ok(())
}

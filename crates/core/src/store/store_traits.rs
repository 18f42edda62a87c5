//! Document store trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::Result;

/// Names one document inside a [`DocumentStore::transact`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub collection: String,
    pub id: String,
}

impl DocumentRef {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

/// Mutation closure passed to [`DocumentStore::transact`].
///
/// Receives one draft slot per [`DocumentRef`], in the same order; a slot is
/// `None` when the document does not exist. Writing `Some` into a slot
/// creates or replaces that document on commit, a slot left `None` stays
/// absent.
pub type TransactFn<'a> = &'a (dyn Fn(&mut [Option<Value>]) -> Result<()> + Send + Sync);

/// Trait defining the contract for document persistence.
///
/// Implementations wrap a managed document store. The trait is deliberately
/// narrow: plain reads and writes for the common path, plus an atomic
/// read-modify-write primitive spanning a fixed set of documents. `transact`
/// is the only strong consistency guarantee in the system; every mutation of
/// shared financial state must go through it.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Retrieves a document, or None when it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Creates or replaces a document.
    async fn set(&self, collection: &str, id: &str, document: Value) -> Result<()>;

    /// Shallow-merges `changes` into an existing document.
    ///
    /// Fails with `NotFound` when the document does not exist.
    async fn update(&self, collection: &str, id: &str, changes: Value) -> Result<()>;

    /// Atomically applies `mutate` across the named documents and returns
    /// the committed slots.
    ///
    /// The read-check-write sequence inside `mutate` is isolated: no
    /// concurrent `transact` touching any of the same documents can
    /// interleave, and either every written slot commits or none does. When
    /// `mutate` returns an error all documents are left untouched and the
    /// error is surfaced to the caller.
    async fn transact(
        &self,
        documents: &[DocumentRef],
        mutate: TransactFn<'_>,
    ) -> Result<Vec<Option<Value>>>;
}

//! In-memory document store.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::Mutex;

use super::store_traits::{DocumentRef, DocumentStore, TransactFn};
use crate::errors::{Error, Result};

/// Dashmap-backed document store.
///
/// `transact` calls serialize on a single gate, so the mutation closure
/// always sees a consistent snapshot of every named document and no two
/// transactions interleave. The closure mutates draft copies that are only
/// committed on success, so a failed mutation leaves every stored document
/// untouched.
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: DashMap<(String, String), Value>,
    transact_gate: Mutex<()>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(collection: &str, id: &str) -> (String, String) {
        (collection.to_string(), id.to_string())
    }

    fn missing(collection: &str, id: &str) -> Error {
        Error::NotFound(format!("{}/{}", collection, id))
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        Ok(self
            .documents
            .get(&Self::key(collection, id))
            .map(|doc| doc.clone()))
    }

    async fn set(&self, collection: &str, id: &str, document: Value) -> Result<()> {
        self.documents.insert(Self::key(collection, id), document);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, changes: Value) -> Result<()> {
        let mut entry = self
            .documents
            .get_mut(&Self::key(collection, id))
            .ok_or_else(|| Self::missing(collection, id))?;

        match (entry.as_object_mut(), changes.as_object()) {
            (Some(doc), Some(changes)) => {
                for (field, value) in changes {
                    doc.insert(field.clone(), value.clone());
                }
                Ok(())
            }
            _ => Err(Error::Upstream(format!(
                "merge update on non-object document {}/{}",
                collection, id
            ))),
        }
    }

    async fn transact(
        &self,
        documents: &[DocumentRef],
        mutate: TransactFn<'_>,
    ) -> Result<Vec<Option<Value>>> {
        let _gate = self.transact_gate.lock().await;

        let mut drafts: Vec<Option<Value>> = documents
            .iter()
            .map(|doc| {
                self.documents
                    .get(&Self::key(&doc.collection, &doc.id))
                    .map(|entry| entry.clone())
            })
            .collect();

        mutate(&mut drafts)?;

        for (doc, draft) in documents.iter().zip(&drafts) {
            if let Some(value) = draft {
                self.documents
                    .insert(Self::key(&doc.collection, &doc.id), value.clone());
            }
        }
        Ok(drafts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_and_get_round_trip() {
        let store = MemoryDocumentStore::new();
        store
            .set("bookings", "b1", json!({"status": "pending"}))
            .await
            .unwrap();

        let doc = store.get("bookings", "b1").await.unwrap();
        assert_eq!(doc, Some(json!({"status": "pending"})));
        assert_eq!(store.get("bookings", "missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_merges_shallowly() {
        let store = MemoryDocumentStore::new();
        store
            .set("bookings", "b1", json!({"status": "pending", "propertyId": "p1"}))
            .await
            .unwrap();

        store
            .update("bookings", "b1", json!({"status": "confirmed"}))
            .await
            .unwrap();

        let doc = store.get("bookings", "b1").await.unwrap().unwrap();
        assert_eq!(doc["status"], "confirmed");
        assert_eq!(doc["propertyId"], "p1");
    }

    #[tokio::test]
    async fn update_missing_document_is_not_found() {
        let store = MemoryDocumentStore::new();
        let err = store
            .update("bookings", "nope", json!({"status": "confirmed"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn transact_commits_every_written_slot() {
        let store = MemoryDocumentStore::new();
        store
            .set("users", "u1", json!({"balance": 10}))
            .await
            .unwrap();

        let refs = [
            DocumentRef::new("users", "u1"),
            DocumentRef::new("transactions", "t1"),
        ];
        let committed = store
            .transact(&refs, &|drafts| {
                let user = drafts[0].as_mut().unwrap();
                user["balance"] = json!(11);
                drafts[1] = Some(json!({"id": "t1", "status": "completed"}));
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(committed[0].as_ref().unwrap()["balance"], 11);
        let user = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(user["balance"], 11);
        let row = store.get("transactions", "t1").await.unwrap().unwrap();
        assert_eq!(row["status"], "completed");
    }

    #[tokio::test]
    async fn missing_documents_arrive_as_empty_slots() {
        let store = MemoryDocumentStore::new();
        let refs = [DocumentRef::new("users", "ghost")];

        store
            .transact(&refs, &|drafts| {
                assert!(drafts[0].is_none());
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(store.get("users", "ghost").await.unwrap(), None);
    }

    #[tokio::test]
    async fn failed_transact_leaves_every_document_untouched() {
        let store = MemoryDocumentStore::new();
        store
            .set("users", "u1", json!({"balance": 10}))
            .await
            .unwrap();
        store
            .set("bookings", "b1", json!({"status": "pending"}))
            .await
            .unwrap();

        let refs = [
            DocumentRef::new("users", "u1"),
            DocumentRef::new("bookings", "b1"),
            DocumentRef::new("transactions", "t1"),
        ];
        let err = store
            .transact(&refs, &|drafts| {
                drafts[0].as_mut().unwrap()["balance"] = json!(999);
                drafts[1].as_mut().unwrap()["status"] = json!("confirmed");
                drafts[2] = Some(json!({"id": "t1"}));
                Err(Error::StateConflict("nope".to_string()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::StateConflict(_)));
        let user = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(user["balance"], 10);
        let booking = store.get("bookings", "b1").await.unwrap().unwrap();
        assert_eq!(booking["status"], "pending");
        assert_eq!(store.get("transactions", "t1").await.unwrap(), None);
    }
}

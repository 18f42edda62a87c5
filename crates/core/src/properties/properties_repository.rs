use std::sync::Arc;

use super::Property;
use crate::constants::PROPERTIES_COLLECTION;
use crate::errors::{Error, Result};
use crate::store::DocumentStore;

/// Read-only repository for property listings.
#[derive(Clone)]
pub struct PropertyRepository {
    store: Arc<dyn DocumentStore>,
}

impl PropertyRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Retrieves a property, or None when the id does not resolve.
    pub async fn find_by_id(&self, property_id: &str) -> Result<Option<Property>> {
        let doc = self.store.get(PROPERTIES_COLLECTION, property_id).await?;
        doc.map(serde_json::from_value).transpose().map_err(Into::into)
    }

    /// Retrieves a property, failing with `NotFound` when the id does not
    /// resolve.
    pub async fn get_by_id(&self, property_id: &str) -> Result<Property> {
        self.find_by_id(property_id).await?.ok_or_else(|| {
            Error::NotFound(format!("property {}", property_id))
        })
    }
}

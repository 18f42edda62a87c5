use serde::{Deserialize, Serialize};

/// Property listing as the coordination core sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub title: String,
    pub owner_id: String,
}

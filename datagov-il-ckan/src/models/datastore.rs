use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One datastore row, keyed by field id
pub type Record = Map<String, Value>;

/// Column metadata returned by `datastore_search`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DatastoreField {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
}

impl DatastoreField {
    /// Field identifier, falling back to `name`
    pub fn key(&self) -> &str {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or(self.name.as_deref())
            .unwrap_or("")
    }
}

/// The `result` member of a `datastore_search` call
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DatastoreSearchResult {
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub fields: Vec<DatastoreField>,
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default)]
    pub total: Option<u64>,
}

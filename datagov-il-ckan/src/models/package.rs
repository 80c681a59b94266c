use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The subset of a CKAN package (dataset) this crate reads
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Package {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub resources: Vec<Resource>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Package {
    /// First resource in catalog order
    pub fn first_resource(&self) -> Option<&Resource> {
        self.resources.first()
    }
}

/// A single file or table belonging to a package
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub datastore_active: Option<bool>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Resource>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let resources: Option<Vec<Resource>> = Option::deserialize(deserializer)?;
    Ok(resources.unwrap_or_default())
}

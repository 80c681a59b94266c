use serde::{Deserialize, Serialize};

use super::action::CatalogAction;

/// Parameters for `package_search`; every field is forwarded verbatim
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageSearchParams {
    /// Solr query string
    pub q: String,
    /// Solr filter query
    pub fq: String,
    /// Sort expression, e.g. `metadata_modified desc`
    pub sort: String,
    pub rows: u32,
    pub start: u32,
    pub include_private: bool,
}

impl Default for PackageSearchParams {
    fn default() -> Self {
        Self {
            q: String::new(),
            fq: String::new(),
            sort: String::new(),
            rows: 20,
            start: 0,
            include_private: false,
        }
    }
}

impl PackageSearchParams {
    pub fn to_action(&self) -> CatalogAction {
        CatalogAction::get("package_search")
            .param("q", self.q.as_str())
            .param("fq", self.fq.as_str())
            .param("sort", self.sort.as_str())
            .param("rows", self.rows)
            .param("start", self.start)
            .param("include_private", self.include_private)
    }
}

/// Parameters for `resource_search`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSearchParams {
    /// Field query such as `name:data`
    pub query: String,
    pub order_by: String,
    pub offset: u32,
    pub limit: u32,
}

impl Default for ResourceSearchParams {
    fn default() -> Self {
        Self {
            query: String::new(),
            order_by: String::new(),
            offset: 0,
            limit: 100,
        }
    }
}

impl ResourceSearchParams {
    pub fn to_action(&self) -> CatalogAction {
        CatalogAction::get("resource_search")
            .param("query", self.query.as_str())
            .param("order_by", self.order_by.as_str())
            .param("offset", self.offset)
            .param("limit", self.limit)
    }
}

/// Parameters for `datastore_search`.
///
/// `resource_id` is required; the rest default to the portal's usual values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatastoreSearchParams {
    pub resource_id: String,
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub distinct: bool,
    #[serde(default = "default_true")]
    pub plain: bool,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    /// Comma separated field list
    #[serde(default)]
    pub fields: String,
    #[serde(default)]
    pub sort: String,
    #[serde(default = "default_true")]
    pub include_total: bool,
    /// `objects`, `lists`, `csv` or `tsv`
    #[serde(default = "default_records_format")]
    pub records_format: String,
}

fn default_true() -> bool {
    true
}

fn default_limit() -> u32 {
    100
}

fn default_records_format() -> String {
    "objects".to_string()
}

impl DatastoreSearchParams {
    /// Defaults for every optional parameter
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            q: String::new(),
            distinct: false,
            plain: true,
            limit: default_limit(),
            offset: 0,
            fields: String::new(),
            sort: String::new(),
            include_total: true,
            records_format: default_records_format(),
        }
    }

    pub fn to_action(&self) -> CatalogAction {
        CatalogAction::get("datastore_search")
            .param("resource_id", self.resource_id.as_str())
            .param("q", self.q.as_str())
            .param("distinct", self.distinct)
            .param("plain", self.plain)
            .param("limit", self.limit)
            .param("offset", self.offset)
            .param("fields", self.fields.as_str())
            .param("sort", self.sort.as_str())
            .param("include_total", self.include_total)
            .param("records_format", self.records_format.as_str())
    }
}

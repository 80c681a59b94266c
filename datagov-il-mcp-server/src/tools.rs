//! Static tool table: names, descriptions and JSON input schemas.

use serde::Serialize;
use serde_json::{Value, json};

/// Every tool the server exposes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    StatusShow,
    LicenseList,
    PackageList,
    PackageSearch,
    PackageShow,
    OrganizationList,
    OrganizationShow,
    ResourceSearch,
    DatastoreSearch,
    FetchData,
    DatasetProfile,
    ChartGenerator,
    MapGenerator,
}

impl Tool {
    pub const ALL: [Tool; 13] = [
        Tool::StatusShow,
        Tool::LicenseList,
        Tool::PackageList,
        Tool::PackageSearch,
        Tool::PackageShow,
        Tool::OrganizationList,
        Tool::OrganizationShow,
        Tool::ResourceSearch,
        Tool::DatastoreSearch,
        Tool::FetchData,
        Tool::DatasetProfile,
        Tool::ChartGenerator,
        Tool::MapGenerator,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Tool::StatusShow => "status_show",
            Tool::LicenseList => "license_list",
            Tool::PackageList => "package_list",
            Tool::PackageSearch => "package_search",
            Tool::PackageShow => "package_show",
            Tool::OrganizationList => "organization_list",
            Tool::OrganizationShow => "organization_show",
            Tool::ResourceSearch => "resource_search",
            Tool::DatastoreSearch => "datastore_search",
            Tool::FetchData => "fetch_data",
            Tool::DatasetProfile => "dataset_profile",
            Tool::ChartGenerator => "chart_generator",
            Tool::MapGenerator => "map_generator",
        }
    }

    /// Tools whose failures come back as an `{"error": ...}` payload instead
    /// of a JSON-RPC fault
    pub fn reports_errors_inline(self) -> bool {
        matches!(
            self,
            Tool::FetchData | Tool::DatasetProfile | Tool::ChartGenerator | Tool::MapGenerator
        )
    }

    pub fn description(self) -> &'static str {
        match self {
            Tool::StatusShow => "Get the CKAN version and installed extensions of data.gov.il",
            Tool::LicenseList => "List the licenses datasets on data.gov.il can be published under",
            Tool::PackageList => "List the names of all datasets on data.gov.il",
            Tool::PackageSearch => {
                "Search datasets with a Solr query, filter query, sort and paging"
            }
            Tool::PackageShow => "Fetch the metadata and resource list of one dataset",
            Tool::OrganizationList => "List the publishing organizations on data.gov.il",
            Tool::OrganizationShow => "Fetch the details of one organization",
            Tool::ResourceSearch => "Search resources by field, e.g. name:data",
            Tool::DatastoreSearch => "Query the rows of a datastore resource",
            Tool::FetchData => {
                "Fetch rows from the first resource of a dataset, looked up by name or id"
            }
            Tool::DatasetProfile => {
                "Profile the fields of a datastore resource: inferred types, missingness and summary statistics"
            }
            Tool::ChartGenerator => {
                "Build a Vega-Lite chart (histogram, bar, line or scatter) from a datastore resource"
            }
            Tool::MapGenerator => {
                "Build a GeoJSON point map with a Leaflet page from the coordinate fields of a datastore resource"
            }
        }
    }

    pub fn input_schema(self) -> Value {
        match self {
            Tool::StatusShow | Tool::LicenseList | Tool::PackageList | Tool::OrganizationList => {
                json!({
                    "type": "object",
                    "properties": {},
                    "additionalProperties": false
                })
            }
            Tool::PackageSearch => json!({
                "type": "object",
                "properties": {
                    "q": {"type": "string", "default": "", "description": "Solr query string"},
                    "fq": {"type": "string", "default": "", "description": "Solr filter query"},
                    "sort": {"type": "string", "default": "", "description": "Sort expression e.g. metadata_modified desc"},
                    "rows": {"type": "integer", "minimum": 0, "default": 20, "description": "Number of datasets to return"},
                    "start": {"type": "integer", "minimum": 0, "default": 0, "description": "Offset into the result set"},
                    "include_private": {"type": "boolean", "default": false, "description": "Include private datasets the API key can see"}
                },
                "additionalProperties": false
            }),
            Tool::PackageShow => json!({
                "type": "object",
                "properties": {
                    "id": {"type": "string", "description": "Dataset id or name"}
                },
                "required": ["id"],
                "additionalProperties": false
            }),
            Tool::OrganizationShow => json!({
                "type": "object",
                "properties": {
                    "id": {"type": "string", "description": "Organization id or name"}
                },
                "required": ["id"],
                "additionalProperties": false
            }),
            Tool::ResourceSearch => json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "default": "", "description": "Field query e.g. name:data"},
                    "order_by": {"type": "string", "default": "", "description": "Field to order results by"},
                    "offset": {"type": "integer", "minimum": 0, "default": 0, "description": "Offset into the result set"},
                    "limit": {"type": "integer", "minimum": 0, "default": 100, "description": "Maximum resources to return"}
                },
                "additionalProperties": false
            }),
            Tool::DatastoreSearch => json!({
                "type": "object",
                "properties": {
                    "resource_id": {"type": "string", "description": "Datastore resource id"},
                    "q": {"type": "string", "default": "", "description": "Full-text query"},
                    "distinct": {"type": "boolean", "default": false, "description": "Return distinct rows only"},
                    "plain": {"type": "boolean", "default": true, "description": "Treat q as plain text"},
                    "limit": {"type": "integer", "minimum": 0, "default": 100, "description": "Maximum rows to return"},
                    "offset": {"type": "integer", "minimum": 0, "default": 0, "description": "Offset into the rows"},
                    "fields": {"type": "string", "default": "", "description": "Comma separated fields to return"},
                    "sort": {"type": "string", "default": "", "description": "Sort expression e.g. name asc"},
                    "include_total": {"type": "boolean", "default": true, "description": "Include the total row count"},
                    "records_format": {"type": "string", "enum": ["objects", "lists", "csv", "tsv"], "default": "objects", "description": "Shape of the returned rows"}
                },
                "required": ["resource_id"],
                "additionalProperties": false
            }),
            Tool::FetchData => json!({
                "type": "object",
                "properties": {
                    "dataset_name": {"type": "string", "description": "Dataset name or id"},
                    "limit": {"type": "integer", "minimum": 0, "default": 100, "description": "Maximum rows to return"},
                    "offset": {"type": "integer", "minimum": 0, "default": 0, "description": "Offset into the rows"}
                },
                "required": ["dataset_name"],
                "additionalProperties": false
            }),
            Tool::DatasetProfile => json!({
                "type": "object",
                "properties": {
                    "resource_id": {"type": "string", "description": "Datastore resource id"},
                    "sample_size": {"type": "integer", "minimum": 1, "default": 100, "description": "Rows to sample"}
                },
                "required": ["resource_id"],
                "additionalProperties": false
            }),
            Tool::ChartGenerator => json!({
                "type": "object",
                "properties": {
                    "resource_id": {"type": "string", "description": "Datastore resource id"},
                    "chart_type": {"type": "string", "enum": ["histogram", "bar", "line", "scatter"], "description": "Kind of chart"},
                    "x_field": {"type": "string", "description": "Field on the x axis"},
                    "y_field": {"type": "string", "default": "", "description": "Field on the y axis; unused by histograms"},
                    "title": {"type": "string", "default": "", "description": "Chart title; defaults to the chart type"},
                    "limit": {"type": "integer", "minimum": 1, "default": 100, "description": "Rows to plot"}
                },
                "required": ["resource_id", "chart_type", "x_field"],
                "additionalProperties": false
            }),
            Tool::MapGenerator => json!({
                "type": "object",
                "properties": {
                    "resource_id": {"type": "string", "description": "Datastore resource id"},
                    "lat_field": {"type": "string", "description": "Field holding the latitude"},
                    "lon_field": {"type": "string", "description": "Field holding the longitude"},
                    "limit": {"type": "integer", "minimum": 1, "default": 500, "description": "Rows to place on the map"}
                },
                "required": ["resource_id", "lat_field", "lon_field"],
                "additionalProperties": false
            }),
        }
    }

    pub fn descriptor(self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name(),
            description: self.description(),
            input_schema: self.input_schema(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

pub fn tool_descriptors() -> Vec<ToolDescriptor> {
    Tool::ALL.into_iter().map(Tool::descriptor).collect()
}

pub fn tool_names() -> Vec<&'static str> {
    Tool::ALL.into_iter().map(Tool::name).collect()
}

use std::future::Future;
use std::time::Duration;

use datagov_il_ckan::models::{DatastoreSearchResult, Package, Record};
use datagov_il_ckan::{CkanClient, ConnectionManager};
use serde::Serialize;

use crate::chart::{ChartArtifact, ChartType, build_chart};
use crate::config::DataGovIlConfig;
use crate::error::{DataGovError, Result, require};
use crate::geo::{MapArtifact, map_artifact};
use crate::profile::{DatasetProfile, profile_records};

/// Rows of the first resource of a dataset
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FetchedRecords {
    pub records: Vec<Record>,
    pub resource_id: String,
}

/// Parameters of a chart request
#[derive(Clone, Debug, PartialEq)]
pub struct ChartRequest<'a> {
    pub resource_id: &'a str,
    pub chart_type: &'a str,
    pub x_field: &'a str,
    pub y_field: Option<&'a str>,
    pub title: Option<&'a str>,
    pub limit: u32,
}

/// High-level client for data.gov.il
///
/// Wraps the CKAN gateway and adds the composite operations: fetching the
/// first resource of a dataset, profiling a resource, and building charts
/// and maps from datastore rows.
#[derive(Debug, Clone)]
pub struct DataGovClient {
    ckan: CkanClient,
    config: DataGovIlConfig,
}

impl DataGovClient {
    /// Create a new client with default configuration
    pub fn new() -> Self {
        Self::with_config(DataGovIlConfig::new())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: DataGovIlConfig) -> Self {
        let ckan = CkanClient::new(config.ckan_config.clone());
        Self { ckan, config }
    }

    /// The underlying gateway, for plain catalog actions
    pub fn ckan(&self) -> &CkanClient {
        &self.ckan
    }

    pub fn config(&self) -> &DataGovIlConfig {
        &self.config
    }

    pub fn connections(&self) -> &ConnectionManager {
        self.ckan.connections()
    }

    /// Release the shared HTTP client; idempotent
    pub fn shutdown(&self) -> bool {
        self.ckan.shutdown()
    }

    /// Run an operation under the configured tool deadline.
    ///
    /// Dropping the inner future cancels any in-flight request.
    pub async fn with_deadline<T, F>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        deadline(self.config.tool_timeout, operation).await
    }

    // === Composite operations ===

    /// Fetch rows of the first resource of a dataset.
    ///
    /// Looks the dataset up with `package_show`, then queries the datastore
    /// of its first resource. The datastore is not touched when the dataset
    /// has no resources.
    ///
    /// # Errors
    ///
    /// [`DataGovError::NoResources`] for a dataset without resources, plus
    /// validation and gateway errors.
    pub async fn fetch_data(
        &self,
        dataset_name: &str,
        limit: u32,
        offset: u32,
    ) -> Result<FetchedRecords> {
        let dataset_name = require("dataset_name", dataset_name)?;
        tracing::info!(dataset = dataset_name, "fetching data for dataset");

        let package: Package = self.ckan.package_show(dataset_name).await?.result_as()?;
        let Some(resource) = package.first_resource() else {
            return Err(DataGovError::NoResources {
                dataset: dataset_name.to_string(),
            });
        };
        let resource_id = resource
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                DataGovError::validation_error(format!(
                    "first resource of dataset '{}' has no id",
                    dataset_name
                ))
            })?;
        tracing::info!(resource_id = %resource_id, "using resource");

        let page = self.datastore_rows(&resource_id, limit, Some(offset)).await?;
        Ok(FetchedRecords {
            records: page.records,
            resource_id,
        })
    }

    /// Profile the fields of a datastore resource from a sample of rows
    pub async fn dataset_profile(
        &self,
        resource_id: &str,
        sample_size: u32,
    ) -> Result<DatasetProfile> {
        let resource_id = require("resource_id", resource_id)?;
        tracing::info!(resource_id, sample_size, "profiling resource");

        let page = self.datastore_rows(resource_id, sample_size, None).await?;
        if page.records.is_empty() {
            return Err(DataGovError::NoRecords);
        }

        let fields = profile_records(&page.fields, &page.records, sample_size as usize);
        Ok(DatasetProfile {
            resource_id: resource_id.to_string(),
            sample_size: page.records.len().min(sample_size as usize),
            total_fields: fields.len(),
            fields,
        })
    }

    /// Build a Vega-Lite chart of up to `limit` rows of a resource.
    ///
    /// The chart type is checked before the other parameters and before any
    /// network call.
    pub async fn chart_generator(&self, request: &ChartRequest<'_>) -> Result<ChartArtifact> {
        let chart_type: ChartType = require("chart_type", request.chart_type)?.parse()?;
        let resource_id = require("resource_id", request.resource_id)?;
        let x_field = require("x_field", request.x_field)?;
        tracing::info!(resource_id, chart_type = %chart_type, "generating chart");

        let page = self.datastore_rows(resource_id, request.limit, None).await?;
        if page.records.is_empty() {
            return Err(DataGovError::NoRecords);
        }

        let spec = build_chart(
            page.records,
            chart_type,
            x_field,
            request.y_field,
            request.title,
        );
        ChartArtifact::render(spec)
    }

    /// Build a GeoJSON map of up to `limit` rows of a resource
    pub async fn map_generator(
        &self,
        resource_id: &str,
        lat_field: &str,
        lon_field: &str,
        limit: u32,
    ) -> Result<MapArtifact> {
        let resource_id = require("resource_id", resource_id)?;
        let lat_field = require("lat_field", lat_field)?;
        let lon_field = require("lon_field", lon_field)?;
        tracing::info!(resource_id, lat_field, lon_field, "generating map");

        let page = self.datastore_rows(resource_id, limit, None).await?;
        if page.records.is_empty() {
            return Err(DataGovError::NoRecords);
        }

        map_artifact(&page.records, lat_field, lon_field, limit as usize)
    }

    async fn datastore_rows(
        &self,
        resource_id: &str,
        limit: u32,
        offset: Option<u32>,
    ) -> Result<DatastoreSearchResult> {
        let response = self.ckan.datastore_page(resource_id, limit, offset).await?;
        Ok(response.result_as()?)
    }
}

impl Default for DataGovClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Bound a future by `timeout`; expiry drops the future
pub async fn deadline<T, F>(timeout: Duration, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(DataGovError::Timeout {
            seconds: timeout.as_secs(),
        }),
    }
}

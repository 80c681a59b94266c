//! Client library for the data.gov.il open-data catalog.
//!
//! Builds on [`datagov_il_ckan`] and adds the composite operations used by
//! the tool server: first-resource data fetching, sample-based profiling,
//! Vega-Lite chart specs and GeoJSON maps.

pub const DATA_GOV_IL_BASE_URL: &str = datagov_il_ckan::DEFAULT_BASE_PATH;

pub use datagov_il_ckan as ckan;

pub mod chart;
pub mod client;
pub mod config;
pub mod error;
pub mod geo;
mod html;
pub mod profile;

pub use client::{ChartRequest, DataGovClient, FetchedRecords, deadline};
pub use config::DataGovIlConfig;
pub use error::{DataGovError, Result};

pub mod action;
pub mod datastore;
pub mod package;
pub mod params;
pub mod response;

pub use action::{CatalogAction, HttpMethod};
pub use datastore::{DatastoreField, DatastoreSearchResult, Record};
pub use package::{Package, Resource};
pub use params::{DatastoreSearchParams, PackageSearchParams, ResourceSearchParams};
pub use response::CatalogResponse;

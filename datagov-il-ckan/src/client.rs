use crate::connection::{ConnectionManager, ConnectionSettings};
use crate::models::{
    CatalogAction, CatalogResponse, DatastoreSearchParams, HttpMethod, PackageSearchParams,
    ResourceSearchParams,
};
use crate::retry::{RetryPolicy, should_retry};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Base URL of the data.gov.il CKAN API
pub const DEFAULT_BASE_PATH: &str = "https://data.gov.il/api/3";

/// User agent identifying this service and its version
pub const DEFAULT_USER_AGENT: &str = concat!("DataGovIL-MCP/", env!("CARGO_PKG_VERSION"));

/// Body reported for a non-2xx response whose body could not be read
pub const UNREADABLE_BODY: &str = "Unknown error";

/// Whole-request timeout applied by the shared client
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the CKAN client
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Base URL for the CKAN API (e.g., "https://data.gov.il/api/3")
    pub base_path: String,
    /// User agent string for HTTP requests
    pub user_agent: String,
    /// Timeout for a single HTTP request
    pub timeout: Duration,
    /// API key for CKAN authentication
    pub api_key: Option<ApiKey>,
    /// Retry budget and backoff between attempts
    pub retry: RetryPolicy,
}

/// API key configuration
#[derive(Debug, Clone)]
pub struct ApiKey {
    /// Optional prefix for the API key (e.g., "Bearer")
    pub prefix: Option<String>,
    /// The actual API key value
    pub key: String,
}

impl Configuration {
    /// Create a new configuration with default values
    pub fn new() -> Configuration {
        Configuration::default()
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            base_path: DEFAULT_BASE_PATH.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            api_key: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// Errors that can occur when calling a CKAN action
///
/// Every variant carries a human-readable message; HTTP failures also keep
/// the status code so callers can branch on it.
///
/// # Examples
///
/// ```rust
/// # use datagov_il_ckan::GatewayError;
/// let err = GatewayError::HttpStatus { status: 404, body: "Not Found".to_string() };
/// assert_eq!(err.status_code(), Some(404));
/// assert!(err.to_string().contains("404"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The request never produced a response: DNS, refused connection,
    /// timeout, or a body that could not be read.
    #[error("Request error: {message}")]
    Network { message: String },

    /// The portal answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Response body text
        body: String,
    },

    /// The portal understood the request and rejected it (`success: false`),
    /// or the exchange failed in a way that is not worth retrying.
    #[error("CKAN API error: {message}")]
    Application { message: String },
}

impl GatewayError {
    /// Wrap a transport failure
    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }

    /// Wrap a failure outside the transport and status taxonomy
    pub fn unexpected(err: impl std::fmt::Display) -> Self {
        Self::Application {
            message: format!("Unexpected error: {}", err),
        }
    }

    /// HTTP status code, when the failure came from a response status
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GatewayError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message without the variant prefix
    pub fn message(&self) -> String {
        match self {
            GatewayError::Network { message } | GatewayError::Application { message } => {
                message.clone()
            }
            GatewayError::HttpStatus { status, body } => format!("HTTP {}: {}", status, body),
        }
    }
}

/// # CKAN Client
///
/// Gateway to the action API of a CKAN portal, data.gov.il by default.
///
/// Every call goes through one shared HTTP client owned by a
/// [`ConnectionManager`] and is retried according to the configured
/// [`RetryPolicy`]: network failures and 5xx responses are retried, 4xx
/// responses and `success: false` bodies are returned at once.
///
/// ## Usage
///
/// ```rust,no_run
/// use datagov_il_ckan::{CkanClient, Configuration};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = CkanClient::new(Configuration::default());
///
///     let packages = client.package_list().await?;
///     println!("{} datasets", packages.result.as_array().map_or(0, Vec::len));
///
///     client.shutdown();
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct CkanClient {
    configuration: Arc<Configuration>,
    connections: Arc<ConnectionManager>,
}

impl std::fmt::Debug for CkanClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CkanClient")
            .field("base_path", &self.configuration.base_path)
            .field("max_retries", &self.configuration.retry.max_retries)
            .finish()
    }
}

impl CkanClient {
    /// Create a client with its own connection manager
    pub fn new(configuration: Configuration) -> Self {
        let connections = Arc::new(ConnectionManager::new(
            ConnectionSettings::from_configuration(&configuration),
        ));
        Self::with_connections(configuration, connections)
    }

    /// Create a client on top of an existing connection manager.
    ///
    /// Clients built this way share one HTTP connection pool.
    pub fn with_connections(
        configuration: Configuration,
        connections: Arc<ConnectionManager>,
    ) -> Self {
        Self {
            configuration: Arc::new(configuration),
            connections,
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    /// Release the shared HTTP client; safe to call more than once
    pub fn shutdown(&self) -> bool {
        self.connections.shutdown()
    }

    /// Full URL of an action endpoint
    pub fn action_url(&self, action: &str) -> String {
        format!(
            "{}/action/{}",
            self.configuration.base_path.trim_end_matches('/'),
            action
        )
    }

    /// Run an action with the configured retry budget
    pub async fn call(&self, action: &CatalogAction) -> Result<CatalogResponse, GatewayError> {
        self.call_with_retries(action, self.configuration.retry.max_retries)
            .await
    }

    /// Run an action allowing `max_retries` retries after the first attempt.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt once the budget is spent, or the
    /// first error that is not worth retrying.
    pub async fn call_with_retries(
        &self,
        action: &CatalogAction,
        max_retries: u32,
    ) -> Result<CatalogResponse, GatewayError> {
        let policy = self.configuration.retry.with_max_retries(max_retries);
        let max_attempts = policy.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            tracing::debug!(
                action = action.name(),
                method = %action.method(),
                attempt,
                max_attempts,
                "calling CKAN action"
            );

            let err = match self.send_once(action).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            if !should_retry(&err, max_attempts - attempt) {
                tracing::debug!(action = action.name(), attempt, error = %err, "CKAN action failed");
                return Err(err);
            }

            let delay = policy.delay_after(attempt);
            tracing::warn!(
                action = action.name(),
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retrying CKAN action"
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    async fn send_once(&self, action: &CatalogAction) -> Result<CatalogResponse, GatewayError> {
        let client = self.connections.acquire()?;
        let url = self.action_url(action.name());

        let request = match action.method() {
            HttpMethod::Get => client.get(&url).query(&action.query_pairs()),
            HttpMethod::Post => client.post(&url).json(action.params()),
        };

        let response = request.send().await.map_err(GatewayError::network)?;
        let status = response.status();

        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    tracing::debug!(
                        action = action.name(),
                        status = status.as_u16(),
                        error = %err,
                        "could not read error response body"
                    );
                    UNREADABLE_BODY.to_string()
                }
            };
            return Err(GatewayError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(GatewayError::network)?;
        let body: Value = serde_json::from_slice(&bytes).map_err(GatewayError::unexpected)?;
        CatalogResponse::from_body(body)
    }

    /// Get the CKAN version and installed extensions
    pub async fn status_show(&self) -> Result<CatalogResponse, GatewayError> {
        self.call(&CatalogAction::post("status_show")).await
    }

    /// List licenses available for datasets
    pub async fn license_list(&self) -> Result<CatalogResponse, GatewayError> {
        self.call(&CatalogAction::get("license_list")).await
    }

    /// List the names of all public datasets
    pub async fn package_list(&self) -> Result<CatalogResponse, GatewayError> {
        self.call(&CatalogAction::get("package_list")).await
    }

    /// Search for datasets (packages)
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use datagov_il_ckan::{CkanClient, Configuration, models::PackageSearchParams};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = CkanClient::new(Configuration::default());
    /// let params = PackageSearchParams {
    ///     q: "תחבורה".to_string(),
    ///     rows: 5,
    ///     ..Default::default()
    /// };
    /// let results = client.package_search(&params).await?;
    /// println!("{}", results.result["count"]);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn package_search(
        &self,
        params: &PackageSearchParams,
    ) -> Result<CatalogResponse, GatewayError> {
        self.call(&params.to_action()).await
    }

    /// Retrieve one dataset by its ID or name, including its resources
    pub async fn package_show(&self, id: &str) -> Result<CatalogResponse, GatewayError> {
        self.call(&CatalogAction::get("package_show").param("id", id))
            .await
    }

    /// List the names of all organizations
    pub async fn organization_list(&self) -> Result<CatalogResponse, GatewayError> {
        self.call(&CatalogAction::get("organization_list")).await
    }

    /// Retrieve one organization by its ID or name
    pub async fn organization_show(&self, id: &str) -> Result<CatalogResponse, GatewayError> {
        self.call(&CatalogAction::get("organization_show").param("id", id))
            .await
    }

    /// Search resources by field values
    pub async fn resource_search(
        &self,
        params: &ResourceSearchParams,
    ) -> Result<CatalogResponse, GatewayError> {
        self.call(&params.to_action()).await
    }

    /// Query a datastore table with the full parameter set
    pub async fn datastore_search(
        &self,
        params: &DatastoreSearchParams,
    ) -> Result<CatalogResponse, GatewayError> {
        self.call(&params.to_action()).await
    }

    /// Fetch a page of rows from a datastore table, sending only
    /// `resource_id`, `limit` and `offset` and leaving the rest to the portal
    pub async fn datastore_page(
        &self,
        resource_id: &str,
        limit: u32,
        offset: Option<u32>,
    ) -> Result<CatalogResponse, GatewayError> {
        let mut action = CatalogAction::get("datastore_search")
            .param("resource_id", resource_id)
            .param("limit", limit);
        if let Some(offset) = offset {
            action = action.param("offset", offset);
        }
        self.call(&action).await
    }
}

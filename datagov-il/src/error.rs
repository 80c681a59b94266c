use datagov_il_ckan::GatewayError;
use thiserror::Error;

/// Errors that can occur when using the data.gov.il client
#[derive(Error, Debug)]
pub enum DataGovError {
    /// Error from the underlying CKAN gateway
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A catalog payload did not have the expected shape
    #[error("Unexpected response shape: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL error
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// A required parameter is missing or blank
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    /// The dataset exists but lists no resources
    #[error("No resources found in dataset '{dataset}'")]
    NoResources { dataset: String },

    /// The datastore returned no rows
    #[error("No records found in resource")]
    NoRecords,

    /// No record carried a usable coordinate pair
    #[error("No valid geographic coordinates found")]
    NoValidCoordinates,

    /// Chart type outside histogram, bar, line and scatter
    #[error("Unsupported chart type: {0}")]
    UnsupportedChartType(String),

    /// The call did not finish within its deadline
    #[error("Operation timed out after {seconds} seconds")]
    Timeout { seconds: u64 },
}

impl DataGovError {
    /// Create a new configuration error
    pub fn config_error<S: Into<String>>(message: S) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation_error<S: Into<String>>(message: S) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    /// Validation error for a required parameter that was absent or blank
    pub fn missing_parameter(name: &str) -> Self {
        Self::validation_error(format!("missing required parameter '{}'", name))
    }

    /// HTTP status of the underlying gateway failure, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            DataGovError::Gateway(err) => err.status_code(),
            _ => None,
        }
    }

    /// Whether this is an expected absence of data rather than a fault
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            DataGovError::NoResources { .. }
                | DataGovError::NoRecords
                | DataGovError::NoValidCoordinates
                | DataGovError::UnsupportedChartType(_)
        )
    }
}

/// Type alias for Results using DataGovError
pub type Result<T> = std::result::Result<T, DataGovError>;

/// Reject absent or blank required parameters before any network call
pub fn require<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DataGovError::missing_parameter(name));
    }
    Ok(trimmed)
}

use std::time::Duration;

use datagov_il_ckan::{ApiKey, Configuration as CkanConfiguration, RetryPolicy};
use url::Url;

use crate::error::{DataGovError, Result};

pub const ENV_BASE_URL: &str = "DATAGOV_IL_BASE_URL";
pub const ENV_API_KEY: &str = "DATAGOV_IL_API_KEY";
pub const ENV_USER_AGENT: &str = "DATAGOV_IL_USER_AGENT";
pub const ENV_TIMEOUT_SECS: &str = "DATAGOV_IL_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "DATAGOV_IL_MAX_RETRIES";
pub const ENV_RETRY_DELAY_MS: &str = "DATAGOV_IL_RETRY_DELAY_MS";
pub const ENV_TOOL_TIMEOUT_SECS: &str = "DATAGOV_IL_TOOL_TIMEOUT_SECS";

/// Default deadline for one tool invocation, retries included
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for the data.gov.il client
#[derive(Debug, Clone)]
pub struct DataGovIlConfig {
    /// CKAN gateway configuration
    pub ckan_config: CkanConfiguration,
    /// Deadline for one tool invocation
    pub tool_timeout: Duration,
}

impl Default for DataGovIlConfig {
    fn default() -> Self {
        Self {
            ckan_config: CkanConfiguration::default(),
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }
}

impl DataGovIlConfig {
    /// Create a new configuration for data.gov.il
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from the `DATAGOV_IL_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from any variable source.
    ///
    /// Unset or blank variables keep their defaults; values that do not parse
    /// are configuration errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::new();

        if let Some(url) = get(ENV_BASE_URL) {
            config = config.with_base_url(url)?;
        }
        if let Some(key) = get(ENV_API_KEY) {
            config = config.with_api_key(key);
        }
        if let Some(user_agent) = get(ENV_USER_AGENT) {
            config = config.with_user_agent(user_agent);
        }
        if let Some(secs) = get(ENV_TIMEOUT_SECS) {
            config = config.with_timeout(Duration::from_secs(parse_positive(ENV_TIMEOUT_SECS, &secs)?));
        }
        if let Some(retries) = get(ENV_MAX_RETRIES) {
            config = config.with_max_retries(parse_number(ENV_MAX_RETRIES, &retries)?);
        }
        if let Some(millis) = get(ENV_RETRY_DELAY_MS) {
            config = config
                .with_retry_delay(Duration::from_millis(parse_number(ENV_RETRY_DELAY_MS, &millis)?));
        }
        if let Some(secs) = get(ENV_TOOL_TIMEOUT_SECS) {
            config = config
                .with_tool_timeout(Duration::from_secs(parse_positive(ENV_TOOL_TIMEOUT_SECS, &secs)?));
        }

        Ok(config)
    }

    /// Point the client at another CKAN API root, e.g. a staging portal
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Result<Self> {
        let base_url = base_url.into();
        let parsed = Url::parse(&base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DataGovError::config_error(format!(
                "base URL must be http or https, got '{}'",
                base_url
            )));
        }
        self.ckan_config.base_path = base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Add API key sent as the `Authorization` header
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.ckan_config.api_key = Some(ApiKey {
            key: api_key.into(),
            prefix: None,
        });
        self
    }

    /// Set custom user agent
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.ckan_config.user_agent = user_agent.into();
        self
    }

    /// Set the per-request HTTP timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.ckan_config.timeout = timeout;
        self
    }

    /// Set how many times a transient failure is retried
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.ckan_config.retry.max_retries = max_retries;
        self
    }

    /// Set the delay before the first retry; later retries double it
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.ckan_config.retry.base_delay = delay;
        self.ckan_config.retry.max_delay = self.ckan_config.retry.max_delay.max(delay);
        self
    }

    /// Replace the whole retry policy
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.ckan_config.retry = policy;
        self
    }

    /// Set the deadline for one tool invocation
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        DataGovError::config_error(format!("{} must be a non-negative integer, got '{}'", name, value))
    })
}

/// Timeouts of zero would expire every call at once
fn parse_positive(name: &str, value: &str) -> Result<u64> {
    let parsed: u64 = parse_number(name, value)?;
    if parsed == 0 {
        return Err(DataGovError::config_error(format!(
            "{} must be greater than zero",
            name
        )));
    }
    Ok(parsed)
}

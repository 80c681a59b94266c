use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

use crate::client::{ApiKey, Configuration, GatewayError};

/// Maximum number of redirects followed before the request is treated as failed
const MAX_REDIRECTS: usize = 10;

/// Settings the shared HTTP client is built from
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// Whole-request timeout applied to every call
    pub timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
    /// Optional API key sent as the `Authorization` header
    pub api_key: Option<ApiKey>,
}

impl ConnectionSettings {
    /// Derive connection settings from a client configuration
    pub fn from_configuration(configuration: &Configuration) -> Self {
        Self {
            timeout: configuration.timeout,
            user_agent: configuration.user_agent.clone(),
            api_key: configuration.api_key.clone(),
        }
    }

    fn build_client(&self) -> Result<reqwest::Client, GatewayError> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            let value = match &api_key.prefix {
                Some(prefix) => format!("{} {}", prefix, api_key.key),
                None => api_key.key.clone(),
            };
            let mut value = HeaderValue::from_str(&value).map_err(GatewayError::unexpected)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .default_headers(headers)
            .build()
            .map_err(GatewayError::unexpected)
    }
}

/// Owner of the one long-lived HTTP client shared by every catalog call.
///
/// The client is created lazily on the first [`acquire`](Self::acquire) and
/// kept alive until [`shutdown`](Self::shutdown). Clones of the underlying
/// `reqwest::Client` share one connection pool, so concurrent callers never
/// open or close connections per call.
#[derive(Debug)]
pub struct ConnectionManager {
    settings: ConnectionSettings,
    client: Mutex<Option<reqwest::Client>>,
    clients_built: AtomicUsize,
}

impl ConnectionManager {
    /// Create a manager; no client is built until the first acquisition
    pub fn new(settings: ConnectionSettings) -> Self {
        Self {
            settings,
            client: Mutex::new(None),
            clients_built: AtomicUsize::new(0),
        }
    }

    /// Return a handle on the shared client, building it on first use.
    ///
    /// The slot lock is held across construction, so concurrent first callers
    /// still end up sharing a single client.
    pub fn acquire(&self) -> Result<ClientHandle, GatewayError> {
        let mut slot = self.slot();
        if let Some(client) = slot.as_ref() {
            return Ok(ClientHandle {
                client: client.clone(),
            });
        }

        let client = self.settings.build_client()?;
        self.clients_built.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            user_agent = %self.settings.user_agent,
            timeout_secs = self.settings.timeout.as_secs_f64(),
            "created shared CKAN HTTP client"
        );
        *slot = Some(client.clone());
        Ok(ClientHandle { client })
    }

    /// Release the shared client. Returns `true` if a client was released;
    /// calling it again is a no-op returning `false`.
    ///
    /// Handles already handed out stay usable until they are dropped.
    pub fn shutdown(&self) -> bool {
        let released = self.slot().take().is_some();
        if released {
            tracing::debug!("released shared CKAN HTTP client");
        }
        released
    }

    /// Whether a client is currently held
    pub fn is_active(&self) -> bool {
        self.slot().is_some()
    }

    /// Number of clients built over the manager's lifetime
    pub fn clients_built(&self) -> usize {
        self.clients_built.load(Ordering::Relaxed)
    }

    /// Settings used for client construction
    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    fn slot(&self) -> MutexGuard<'_, Option<reqwest::Client>> {
        self.client.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Scoped access to the shared HTTP client for one logical call
#[derive(Debug, Clone)]
pub struct ClientHandle {
    client: reqwest::Client,
}

impl Deref for ClientHandle {
    type Target = reqwest::Client;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

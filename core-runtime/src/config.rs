//! # Core Configuration Module
//!
//! Provides configuration management for the catalog core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! [`CatalogConfig`] holding the API credentials, endpoint locations, paging
//! defaults and injected bridges. `build()` validates everything up front so
//! a misconfigured client fails at startup instead of on the first fetch.
//!
//! ## Required Settings
//!
//! - `client_id` / `client_secret` - application credentials for the
//!   client-credentials grant
//!
//! ## Optional Dependencies (with defaults)
//!
//! - `HttpClient` - required unless the host enables the desktop default in
//!   `core-service` (feature `desktop-shims`)
//! - `Clock` - defaults to [`SystemClock`]
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CatalogConfig;
//!
//! let config = CatalogConfig::builder()
//!     .client_id("my-client-id")
//!     .client_secret("my-client-secret")
//!     .market("SE")
//!     .page_size(30)
//!     .build()?;
//! ```
//!
//! ## Environment
//!
//! [`CatalogConfigBuilder::from_env`] seeds a builder from `CATALOG_CLIENT_ID`,
//! `CATALOG_CLIENT_SECRET`, `CATALOG_API_BASE_URL`, `CATALOG_TOKEN_URL` and
//! `CATALOG_MARKET`.

use crate::error::{Error, Result};
use bridge_traits::{Clock, HttpClient, SystemClock};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default catalog API root.
pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";

/// Default OAuth token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Largest page the remote API will serve.
pub const MAX_REMOTE_PAGE_SIZE: u32 = 50;

/// Upper bound for the credential refresh leeway (one day).
pub const MAX_REFRESH_LEEWAY_SECS: i64 = 86_400;

const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_DASHBOARD_CATEGORY_LIMIT: u32 = 6;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Core configuration for the catalog client.
///
/// Use [`CatalogConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CatalogConfig {
    /// OAuth client identifier
    pub client_id: String,

    /// OAuth client secret
    pub client_secret: String,

    /// Root URL of the catalog API (no trailing slash)
    pub api_base_url: String,

    /// OAuth token endpoint
    pub token_url: String,

    /// ISO 3166-1 alpha-2 market used to filter catalog content
    pub market: Option<String>,

    /// Items requested per page by pagers
    pub page_size: u32,

    /// How many categories the home dashboard expands
    pub dashboard_category_limit: u32,

    /// Seconds before nominal expiry at which a credential is replaced
    pub credential_refresh_leeway_secs: i64,

    /// Per-request timeout handed to the HTTP client
    pub request_timeout: Duration,

    /// Capacity of the event bus channel
    pub event_buffer_size: usize,

    /// HTTP client for API requests (optional with desktop default)
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Time source
    pub clock: Arc<dyn Clock>,
}

impl fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("token_url", &self.token_url)
            .field("market", &self.market)
            .field("page_size", &self.page_size)
            .field("dashboard_category_limit", &self.dashboard_category_limit)
            .field(
                "credential_refresh_leeway_secs",
                &self.credential_refresh_leeway_secs,
            )
            .field("request_timeout", &self.request_timeout)
            .field("http_client", &self.http_client.is_some())
            .finish()
    }
}

impl CatalogConfig {
    /// Creates a new builder for constructing a `CatalogConfig`.
    pub fn builder() -> CatalogConfigBuilder {
        CatalogConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(Error::Config(
                "Client id cannot be empty. Set it on the builder or via CATALOG_CLIENT_ID."
                    .to_string(),
            ));
        }

        if self.client_secret.trim().is_empty() {
            return Err(Error::Config(
                "Client secret cannot be empty. Set it on the builder or via CATALOG_CLIENT_SECRET."
                    .to_string(),
            ));
        }

        validate_url("API base URL", &self.api_base_url)?;
        validate_url("Token URL", &self.token_url)?;

        if let Some(market) = &self.market {
            if market.len() != 2 || !market.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(Error::Config(format!(
                    "Market must be a two-letter ISO 3166-1 code, got '{}'",
                    market
                )));
            }
        }

        if self.page_size == 0 || self.page_size > MAX_REMOTE_PAGE_SIZE {
            return Err(Error::Config(format!(
                "Page size must be between 1 and {}, got {}",
                MAX_REMOTE_PAGE_SIZE, self.page_size
            )));
        }

        if self.dashboard_category_limit > MAX_REMOTE_PAGE_SIZE {
            return Err(Error::Config(format!(
                "Dashboard category limit exceeds maximum of {}",
                MAX_REMOTE_PAGE_SIZE
            )));
        }

        if !(0..=MAX_REFRESH_LEEWAY_SECS).contains(&self.credential_refresh_leeway_secs) {
            return Err(Error::Config(format!(
                "Credential refresh leeway must be between 0 and {} seconds, got {}",
                MAX_REFRESH_LEEWAY_SECS, self.credential_refresh_leeway_secs
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Returns the injected HTTP client or an actionable error.
    pub fn require_http_client(&self) -> Result<Arc<dyn HttpClient>> {
        self.http_client
            .clone()
            .ok_or_else(|| Error::CapabilityMissing {
                capability: "HttpClient".to_string(),
                message: "No HTTP client implementation provided. \
                          Desktop: enable the 'desktop-shims' feature of core-service. \
                          Mobile: inject a platform-native adapter."
                    .to_string(),
            })
    }
}

fn validate_url(name: &str, value: &str) -> Result<()> {
    if !(value.starts_with("https://") || value.starts_with("http://")) {
        return Err(Error::Config(format!(
            "{} must be an absolute http(s) URL, got '{}'",
            name, value
        )));
    }
    if value.ends_with('/') {
        return Err(Error::Config(format!(
            "{} must not end with '/', got '{}'",
            name, value
        )));
    }
    Ok(())
}

/// Builder for constructing [`CatalogConfig`] instances.
#[derive(Default)]
pub struct CatalogConfigBuilder {
    client_id: Option<String>,
    client_secret: Option<String>,
    api_base_url: Option<String>,
    token_url: Option<String>,
    market: Option<String>,
    page_size: Option<u32>,
    dashboard_category_limit: Option<u32>,
    credential_refresh_leeway_secs: Option<i64>,
    request_timeout: Option<Duration>,
    event_buffer_size: Option<usize>,
    http_client: Option<Arc<dyn HttpClient>>,
    clock: Option<Arc<dyn Clock>>,
}

impl CatalogConfigBuilder {
    /// Seeds a builder from `CATALOG_*` environment variables.
    ///
    /// Missing variables are left unset; explicit builder calls override them.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            client_id: non_empty("CATALOG_CLIENT_ID"),
            client_secret: non_empty("CATALOG_CLIENT_SECRET"),
            api_base_url: non_empty("CATALOG_API_BASE_URL"),
            token_url: non_empty("CATALOG_TOKEN_URL"),
            market: non_empty("CATALOG_MARKET"),
            ..Self::default()
        }
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }

    pub fn market(mut self, market: impl Into<String>) -> Self {
        self.market = Some(market.into());
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn dashboard_category_limit(mut self, limit: u32) -> Self {
        self.dashboard_category_limit = Some(limit);
        self
    }

    pub fn credential_refresh_leeway_secs(mut self, seconds: i64) -> Self {
        self.credential_refresh_leeway_secs = Some(seconds);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid setting.
    pub fn build(self) -> Result<CatalogConfig> {
        let config = CatalogConfig {
            client_id: self.client_id.unwrap_or_default(),
            client_secret: self.client_secret.unwrap_or_default(),
            api_base_url: self
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            token_url: self
                .token_url
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            market: self.market.map(|m| m.to_ascii_uppercase()),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            dashboard_category_limit: self
                .dashboard_category_limit
                .unwrap_or(DEFAULT_DASHBOARD_CATEGORY_LIMIT),
            credential_refresh_leeway_secs: self.credential_refresh_leeway_secs.unwrap_or(0),
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            http_client: self.http_client,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        };

        config.validate()?;
        Ok(config)
    }
}

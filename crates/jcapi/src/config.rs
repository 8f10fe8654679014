//! Client configuration.

use crate::error::{Error, Result};
use declarative::{Credentials, ProviderConfig};
use std::time::Duration;
use url::Url;

/// Default JumpCloud v2 API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://console.jumpcloud.com/api/v2";

/// Default per-request timeout when the operation has no deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for [`HttpClient`](crate::HttpClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    credentials: Credentials,
    timeout: Duration,
    user_agent: String,
}

impl ClientConfig {
    /// Configuration for the default endpoint.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials,
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("jcapi/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Configuration from resolved credentials and the provider block.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `base_url` is not an http(s) URL.
    pub fn from_provider(credentials: &Credentials, provider: &ProviderConfig) -> Result<Self> {
        let config = Self::new(credentials.clone());
        match provider.base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            Some(url) => config.with_base_url(url),
            None => Ok(config),
        }
    }

    /// Use a different API endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `url` is not an http(s) URL.
    pub fn with_base_url(mut self, url: &str) -> Result<Self> {
        let url = url.trim().trim_end_matches('/');
        let parsed = Url::parse(url).map_err(|e| {
            Error::InvalidConfig(format!("base_url {url:?} is not a valid URL: {e}"))
        })?;
        let has_host = parsed.host_str().is_some_and(|host| !host.is_empty());
        if !matches!(parsed.scheme(), "http" | "https") || !has_host {
            return Err(Error::InvalidConfig(format!(
                "base_url must be an http(s) URL with a host, got {url:?}"
            )));
        }
        self.base_url = url.to_string();
        Ok(self)
    }

    /// Per-request timeout used when the operation has no deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// API endpoint, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolved credentials.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Default request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `User-Agent` header value.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

//! Client configuration

use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;
use zeroize::Zeroizing;

use crate::backoff::BackoffPolicy;

pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_API_VERSION: &str = "v21.0";
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_PAGES: usize = 100;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Invalid API version '{0}': expected the form v<major>.<minor>")]
    InvalidApiVersion(String),

    #[error("No access token configured")]
    MissingToken,

    #[error("App secret rejected as an HMAC key: {0}")]
    InvalidAppSecret(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Everything the [`Client`](crate::Client) needs besides its collaborators.
///
/// Secrets are held in [`Zeroizing`] buffers and never printed by `Debug`.
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub api_version: String,
    pub access_token: Option<Zeroizing<String>>,
    /// Enables `appsecret_proof` on every request when set
    pub app_secret: Option<Zeroizing<String>>,
    pub max_retries: u32,
    /// Per-attempt HTTP timeout
    pub timeout: Duration,
    pub backoff: BackoffPolicy,
    /// Hard ceiling on pages fetched when following cursors
    pub max_pages: usize,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            api_version: DEFAULT_API_VERSION.to_string(),
            access_token: None,
            app_secret: None,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: DEFAULT_TIMEOUT,
            backoff: BackoffPolicy::default(),
            max_pages: DEFAULT_MAX_PAGES,
            user_agent: format!("ads-cli/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |s: &Option<Zeroizing<String>>| s.as_ref().map(|_| "<redacted>");
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_version", &self.api_version)
            .field("access_token", &redact(&self.access_token))
            .field("app_secret", &redact(&self.app_secret))
            .field("max_retries", &self.max_retries)
            .field("timeout", &self.timeout)
            .field("backoff", &self.backoff)
            .field("max_pages", &self.max_pages)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and set the API host. Only `http` and `https` are accepted.
    pub fn with_base_url(mut self, url: &str) -> Result<Self, ConfigError> {
        let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        if parsed.host_str().is_none() {
            return Err(ConfigError::InvalidBaseUrl {
                url: url.to_string(),
                reason: "missing host".to_string(),
            });
        }
        self.base_url = parsed;
        Ok(self)
    }

    pub fn with_api_version(mut self, version: &str) -> Result<Self, ConfigError> {
        if !is_api_version(version) {
            return Err(ConfigError::InvalidApiVersion(version.to_string()));
        }
        self.api_version = version.to_string();
        Ok(self)
    }

    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(Zeroizing::new(token.into()));
        self
    }

    #[must_use]
    pub fn with_app_secret(mut self, secret: impl Into<String>) -> Self {
        self.app_secret = Some(Zeroizing::new(secret.into()));
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    #[must_use]
    pub fn with_max_pages(mut self, pages: usize) -> Self {
        self.max_pages = pages.max(1);
        self
    }

    /// Absolute URL for an API path under the configured version.
    pub fn endpoint_url(&self, path: &str) -> Result<Url, ConfigError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| ConfigError::InvalidBaseUrl {
                    url: self.base_url.to_string(),
                    reason: "cannot be a base".to_string(),
                })?;
            segments.pop_if_empty().push(&self.api_version);
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }
}

/// `v` followed by `<major>.<minor>` digits, e.g. `v21.0`.
fn is_api_version(version: &str) -> bool {
    let Some(rest) = version.strip_prefix('v') else {
        return false;
    };
    let mut parts = rest.split('.');
    let numeric = |p: Option<&str>| {
        p.is_some_and(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
    };
    numeric(parts.next()) && numeric(parts.next()) && parts.next().is_none()
}

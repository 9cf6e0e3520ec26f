//! The HTTP exchange seam

use ads_core::HttpMethod;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::trace;
use url::Url;
use zeroize::Zeroizing;

use crate::config::ConfigError;

/// One fully-resolved HTTP request
#[derive(Clone)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub query: Vec<(String, String)>,
    /// Form-encoded body; empty for GET
    pub form: Vec<(String, String)>,
    pub bearer: Option<Zeroizing<String>>,
}

impl PreparedRequest {
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            query: Vec::new(),
            form: Vec::new(),
            bearer: None,
        }
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        lookup(&self.query, key)
    }

    pub fn form_value(&self, key: &str) -> Option<&str> {
        lookup(&self.form, key)
    }
}

fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

impl fmt::Debug for PreparedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("query", &self.query)
            .field("form", &self.form)
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Status, lowercased headers and body of a response, whatever its status
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to complete an exchange at all
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    /// No connection was established; the request never reached the API
    #[error("connection failed: {0}")]
    Connect(String),

    /// The request may have reached the API but no response arrived in time
    #[error("timed out: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

/// Sends one request and returns the response, without interpreting it.
#[async_trait]
pub trait HttpExchange: Send + Sync {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, ExchangeError>;
}

/// [`HttpExchange`] over a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestExchange {
    client: reqwest::Client,
}

impl ReqwestExchange {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpExchange for ReqwestExchange {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, ExchangeError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, request.url.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token.as_str());
        }

        trace!("Sending {} {}", request.method, request.url);
        let response = builder.send().await.map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(map_reqwest_error)?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ExchangeError {
    let connect = err.is_connect();
    let timeout = err.is_timeout();
    // reqwest includes the full URL; strip it so tokens in query strings never leak
    let message = err.without_url().to_string();
    if connect {
        ExchangeError::Connect(message)
    } else if timeout {
        ExchangeError::Timeout(message)
    } else {
        ExchangeError::Other(message)
    }
}

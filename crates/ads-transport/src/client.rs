//! Request execution with retry, backoff and cursor following

use ads_core::{HttpMethod, RequestSpec};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::appsecret_proof;
use crate::backoff::{JitterSource, RandomJitter, Sleeper, TokioSleeper};
use crate::cancel::CancelToken;
use crate::classify::{ClassifyContext, ErrorClassifier};
use crate::config::{ClientConfig, ConfigError};
use crate::exchange::{ExchangeError, HttpExchange, PreparedRequest, RawResponse, ReqwestExchange};
use crate::paging::{PageOptions, Paging, PagingCursor, page_items};
use crate::rate_limit::RateLimitInfo;
use crate::{Result, TransportError};

/// A successful response
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub payload: Value,
    pub paging: Option<Paging>,
    pub rate_limit: Option<RateLimitInfo>,
    /// Attempts made, including the one that succeeded
    pub attempts: u32,
}

/// Items accumulated across followed pages
#[derive(Debug, Clone, Default)]
pub struct PagedResponse {
    /// Page order, then within-page order
    pub data: Vec<Value>,
    pub pages: usize,
    /// Paging block of the last page fetched
    pub paging: Option<Paging>,
    /// Usage reported with the most recent page
    pub rate_limit: Option<RateLimitInfo>,
    /// More items were available when following stopped
    pub truncated: bool,
}

/// Executes requests one attempt at a time.
///
/// Attempts and pages are strictly sequential; nothing is sent in parallel.
pub struct Client {
    config: ClientConfig,
    exchange: Arc<dyn HttpExchange>,
    sleeper: Arc<dyn Sleeper>,
    jitter: Arc<dyn JitterSource>,
    classifier: ErrorClassifier,
}

impl Client {
    /// Client over a real HTTP connection pool.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let exchange = ReqwestExchange::new(config.timeout, &config.user_agent)?;
        Ok(Self::with_exchange(config, Arc::new(exchange)))
    }

    pub fn with_exchange(config: ClientConfig, exchange: Arc<dyn HttpExchange>) -> Self {
        Self {
            config,
            exchange,
            sleeper: Arc::new(TokioSleeper),
            jitter: Arc::new(RandomJitter),
            classifier: ErrorClassifier::new(),
        }
    }

    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: Arc<dyn JitterSource>) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send one request, retrying retryable failures.
    pub async fn execute(&self, spec: &RequestSpec, cancel: &CancelToken) -> Result<Response> {
        let request = self.prepare(spec)?;
        let context = ClassifyContext::from_spec(spec);
        self.send_with_retry(&request, &context, cancel).await
    }

    /// Send a request and follow `paging.next` until the cursor runs out,
    /// `options.limit` items are collected, or `max_pages` pages were fetched.
    pub async fn execute_paged(
        &self,
        spec: &RequestSpec,
        options: &PageOptions,
        cancel: &CancelToken,
    ) -> Result<PagedResponse> {
        let context = ClassifyContext::from_spec(spec);
        let mut request = self.prepare(spec)?;
        let mut result = PagedResponse::default();

        loop {
            let response = self.send_with_retry(&request, &context, cancel).await?;
            result.pages += 1;
            if response.rate_limit.is_some() {
                result.rate_limit = response.rate_limit;
            }
            result.data.extend(page_items(response.payload));
            result.paging = response.paging;

            let next = result.paging.as_ref().and_then(Paging::next_cursor).cloned();

            if let Some(limit) = options.limit {
                if result.data.len() >= limit {
                    result.truncated = result.data.len() > limit || next.is_some();
                    result.data.truncate(limit);
                    break;
                }
            }

            let Some(cursor) = next else {
                break;
            };

            if result.pages >= self.config.max_pages {
                warn!(
                    "Stopped following {} after {} page(s); more results are available",
                    spec.path(),
                    result.pages
                );
                result.truncated = true;
                break;
            }

            request = self.follow(&request, &cursor)?;
        }

        debug!(
            "Collected {} item(s) from {} page(s) of {}",
            result.data.len(),
            result.pages,
            spec.path()
        );
        Ok(result)
    }

    fn prepare(&self, spec: &RequestSpec) -> Result<PreparedRequest> {
        let token = self
            .config
            .access_token
            .clone()
            .ok_or(ConfigError::MissingToken)?;
        let url = self.config.endpoint_url(spec.path())?;

        let mut request = PreparedRequest::new(spec.method(), url);
        if !spec.fields().is_empty() {
            request
                .query
                .push(("fields".to_string(), spec.fields().join(",")));
        }
        match spec.method() {
            HttpMethod::Get => request.query.extend(spec.params().iter().cloned()),
            HttpMethod::Post | HttpMethod::Delete => {
                request.form.extend(spec.params().iter().cloned());
            }
        }
        if let Some(secret) = &self.config.app_secret {
            let proof = appsecret_proof(&token, secret)?;
            request.query.push(("appsecret_proof".to_string(), proof));
        }
        request.bearer = Some(token);
        Ok(request)
    }

    /// Request for the page a cursor points at. Cursors must stay on the API host.
    fn follow(
        &self,
        previous: &PreparedRequest,
        cursor: &PagingCursor,
    ) -> Result<PreparedRequest> {
        let url = cursor.to_url().ok_or_else(|| {
            TransportError::InvalidRequest(format!(
                "paging cursor is not a URL: {}",
                cursor.as_str()
            ))
        })?;
        let base = &self.config.base_url;
        if url.scheme() != base.scheme()
            || url.host_str() != base.host_str()
            || url.port_or_known_default() != base.port_or_known_default()
        {
            return Err(TransportError::InvalidRequest(format!(
                "paging cursor points at foreign host '{}'",
                url.host_str().unwrap_or_default()
            )));
        }

        let mut request = PreparedRequest::new(HttpMethod::Get, url);
        request.bearer.clone_from(&previous.bearer);
        let has_proof = request.url.query_pairs().any(|(k, _)| k == "appsecret_proof");
        if !has_proof {
            if let Some(proof) = previous.query_value("appsecret_proof") {
                request
                    .query
                    .push(("appsecret_proof".to_string(), proof.to_string()));
            }
        }
        Ok(request)
    }

    async fn send_with_retry(
        &self,
        request: &PreparedRequest,
        context: &ClassifyContext,
        cancel: &CancelToken,
    ) -> Result<Response> {
        let endpoint = format!("{} {}", request.method, request.url.path());
        let max_retries = self.config.max_retries;
        let mut attempt: u32 = 0;

        loop {
            if let Some(reason) = cancel.reason() {
                return Err(TransportError::Cancelled { endpoint, reason });
            }

            debug!("Attempt {} of {} for {}", attempt + 1, max_retries + 1, endpoint);
            let outcome = tokio::select! {
                biased;
                reason = cancel.cancelled() => {
                    return Err(TransportError::Cancelled { endpoint, reason });
                }
                outcome = self.exchange.send(request) => outcome,
            };

            match outcome {
                Ok(raw) if raw.is_success() => {
                    info!("{} -> HTTP {} (attempt {})", endpoint, raw.status, attempt + 1);
                    return self.decode(raw, attempt + 1, &endpoint);
                }
                Ok(raw) => {
                    let mut classified = self
                        .classifier
                        .classify_with_context(raw.status, &raw.body, context);
                    if let Some(usage) = RateLimitInfo::from_response(&raw) {
                        if let Ok(value) = serde_json::to_value(usage) {
                            classified.diagnostics.insert("rate_limit".to_string(), value);
                        }
                    }

                    if !classified.retryable {
                        info!("{} failed: {}", endpoint, classified);
                        return Err(TransportError::Api(Box::new(classified)));
                    }
                    if attempt >= max_retries {
                        warn!(
                            "{} failed after {} attempt(s): {}",
                            endpoint,
                            attempt + 1,
                            classified
                        );
                        return Err(TransportError::RetryExhausted {
                            attempts: attempt + 1,
                            last: Box::new(classified),
                        });
                    }
                    warn!("Retryable failure on {}: {}", endpoint, classified);
                }
                Err(err) => {
                    let retryable = match &err {
                        ExchangeError::Connect(_) => true,
                        // a timed-out mutation may already have been applied
                        ExchangeError::Timeout(_) => request.method == HttpMethod::Get,
                        ExchangeError::Other(_) => false,
                    };
                    if !retryable || attempt >= max_retries {
                        return Err(TransportError::Network {
                            endpoint,
                            message: err.to_string(),
                            retryable,
                        });
                    }
                    warn!("Network failure on {}: {}", endpoint, err);
                }
            }

            let delay = self.config.backoff.delay(attempt, self.jitter.sample());
            debug!(
                "Backing off {:?} (ceiling {:?}) before retrying {}",
                delay,
                self.config.backoff.ceiling(attempt),
                endpoint
            );
            tokio::select! {
                biased;
                reason = cancel.cancelled() => {
                    return Err(TransportError::Cancelled { endpoint, reason });
                }
                () = self.sleeper.sleep(delay) => {}
            }
            attempt += 1;
        }
    }

    fn decode(&self, raw: RawResponse, attempts: u32, endpoint: &str) -> Result<Response> {
        let payload = if raw.body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&raw.body).map_err(|e| TransportError::Decode {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?
        };
        Ok(Response {
            status: raw.status,
            paging: Paging::from_payload(&payload),
            rate_limit: RateLimitInfo::from_response(&raw),
            payload,
            attempts,
        })
    }
}

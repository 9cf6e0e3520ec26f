#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # ads-transport
//!
//! Executes requests against the ads API and turns failures into
//! actionable, classified errors.
//!
//! The [`Client`] sends one request per attempt through an injected
//! [`HttpExchange`], classifies non-2xx responses with the
//! [`ErrorClassifier`], retries retryable failures with exponential backoff
//! and, on request, follows `paging.next` cursors. Every wait honours a
//! [`CancelToken`].
//!
//! ## Retry policy
//!
//! Attempts are numbered `0..=max_retries`. Retryable classified errors
//! (rate limits, transient server errors) are retried until attempts run
//! out, then surface as [`TransportError::RetryExhausted`]. Validation and
//! permission failures are never retried because repeating a mutation that
//! the API rejected cannot succeed and may double-apply side effects.

pub mod auth;
pub mod backoff;
pub mod cancel;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod exchange;
pub mod paging;
pub mod rate_limit;
pub mod remediation;

pub use backoff::{BackoffPolicy, FixedJitter, JitterSource, RandomJitter, Sleeper, TokioSleeper};
pub use cancel::{CancelReason, CancelToken};
pub use classify::{ClassifyContext, ErrorClassifier};
pub use client::{Client, PagedResponse, Response};
pub use config::{ClientConfig, ConfigError};
pub use error::{ClassifiedError, Remediation, RemediationCategory};
pub use exchange::{ExchangeError, HttpExchange, PreparedRequest, RawResponse, ReqwestExchange};
pub use paging::{Cursors, PageOptions, Paging, PagingCursor};
pub use rate_limit::RateLimitInfo;

use thiserror::Error;

/// Terminal outcome of a failed request
#[derive(Error, Debug)]
pub enum TransportError {
    /// The request could not be delivered or its response not read
    #[error("Network error calling {endpoint}: {message}")]
    Network {
        endpoint: String,
        message: String,
        retryable: bool,
    },

    /// The caller's cancellation signal fired
    #[error("Request to {endpoint} cancelled: {reason}")]
    Cancelled {
        endpoint: String,
        reason: CancelReason,
    },

    /// The API rejected the request with a non-retryable error
    #[error("{0}")]
    Api(Box<ClassifiedError>),

    /// Every attempt failed with a retryable error
    #[error("Gave up after {attempts} attempt(s): {last}")]
    RetryExhausted {
        attempts: u32,
        last: Box<ClassifiedError>,
    },

    /// A 2xx response body was not the JSON the API promises
    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl TransportError {
    /// The classified API error behind this failure, if any.
    pub fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            Self::Api(err) | Self::RetryExhausted { last: err, .. } => Some(err.as_ref()),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Short machine-readable tag for envelopes and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Cancelled { .. } => "cancelled",
            Self::Api(_) => "api",
            Self::RetryExhausted { .. } => "retry_exhausted",
            Self::Decode { .. } => "decode",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Config(_) => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

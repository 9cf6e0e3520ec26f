#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # ads-core
//!
//! Request descriptions shared by the linter, the transport client and the
//! command-line front end.
//!
//! A [`RequestSpec`] is built once by a command and then handed, unchanged,
//! first to the linter and then to the transport client.

/// HTTP verbs supported by the API.
pub mod method;
/// `key=value` parameter parsing for command-line input.
pub mod param;
/// Immutable request description and entity derivation.
pub mod request;

/// HTTP verb of a request.
pub use method::HttpMethod;
/// Parameter parsing helpers.
pub use param::{parse_fields, parse_param};
/// Request description and path helpers.
pub use request::{RequestSpec, entity_segment, singularize};

use thiserror::Error;

/// Errors that can occur while building a request description
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unsupported HTTP method '{method}' (expected GET, POST or DELETE)")]
    InvalidMethod { method: String },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Invalid parameter '{input}': {reason}")]
    InvalidParam { input: String, reason: String },
}

impl Error {
    /// Build an invalid-method error.
    pub fn invalid_method(method: impl Into<String>) -> Self {
        Self::InvalidMethod {
            method: method.into(),
        }
    }

    /// Build an invalid-path error with the offending path and reason.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build an invalid-parameter error with the raw input and reason.
    pub fn invalid_param(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParam {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, Error>;

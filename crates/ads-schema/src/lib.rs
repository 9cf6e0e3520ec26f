//! # ads-schema
//!
//! Versioned schema packs describing, per API domain and version, which
//! read fields each entity exposes and which parameters each endpoint
//! accepts.
//!
//! Packs live on disk as `<root>/<domain>/<version>.json` (or `.yaml`) and
//! are cached for the life of the process once loaded.

pub mod loader;
pub mod model;
pub mod registry;

pub use loader::SchemaProvider;
pub use model::{PackKey, SchemaPack};
pub use registry::PackRegistry;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when working with schema packs
#[derive(Error, Debug)]
pub enum Error {
    #[error("Schema pack {domain}/{version} not found under {}", .root.display())]
    NotFound {
        domain: String,
        version: String,
        root: PathBuf,
    },

    #[error("No schema packs for domain '{domain}' under {}", .root.display())]
    DomainNotFound { domain: String, root: PathBuf },

    #[error("Invalid schema format in {}: {message}", .path.display())]
    InvalidFormat { path: PathBuf, message: String },

    #[error("Schema pack {} declares {found} but was requested as {expected}", .path.display())]
    KeyMismatch {
        path: PathBuf,
        expected: PackKey,
        found: PackKey,
    },

    #[error("Invalid schema key: {0}")]
    InvalidKey(String),

    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Build a format error for content read from `path`.
    pub fn invalid_format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Build an I/O error with the path being read.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error means "no such pack" rather than a broken one.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::DomainNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

//! # ads-cli
//!
//! The `ads` command: parses flags, lints requests against the schema pack,
//! executes them through the transport client and prints one envelope per
//! command. Credentials, output and resource tracking are injected so the
//! runner can be driven without a process environment.
//!
//! ## Exit codes
//!
//! | code | meaning |
//! |------|---------|
//! | 0 | success (lint warnings allowed) |
//! | 1 | API, network or output failure |
//! | 2 | invalid usage |
//! | 3 | lint violations |
//! | 4 | schema pack could not be loaded |
//! | 5 | missing credentials or invalid client configuration |
//! | 6 | cancelled by Ctrl-C or the `--deadline` |

pub mod args;
pub mod commands;
pub mod credentials;
pub mod output;
pub mod tracking;

pub use args::{Cli, Command, GlobalArgs};
pub use commands::{Outcome, Runner};
pub use credentials::{CredentialError, CredentialResolver, Credentials, EnvCredentialResolver};
pub use output::{Envelope, EnvelopeWriter, OutputFormat};
pub use tracking::{JsonlLedger, NoopSink, ResourceSink, TrackedResource};

use ads_transport::TransportError;
use thiserror::Error;

pub const EXIT_OK: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_USAGE: u8 = 2;
pub const EXIT_LINT: u8 = 3;
pub const EXIT_SCHEMA: u8 = 4;
pub const EXIT_CONFIG: u8 = 5;
pub const EXIT_CANCELLED: u8 = 6;

/// Any failure a command can end with
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Request(#[from] ads_core::Error),

    #[error(transparent)]
    Schema(#[from] ads_schema::Error),

    #[error(transparent)]
    Lint(#[from] ads_lint::Error),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Entity '{entity}' is not described by schema pack {pack}")]
    UnknownEntity { entity: String, pack: String },
}

impl CliError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Request(_) => EXIT_USAGE,
            Self::Lint(_) => EXIT_LINT,
            Self::Schema(_) | Self::UnknownEntity { .. } => EXIT_SCHEMA,
            Self::Credentials(_) | Self::Transport(TransportError::Config(_)) => EXIT_CONFIG,
            Self::Transport(TransportError::Cancelled { .. }) => EXIT_CANCELLED,
            Self::Transport(_) => EXIT_FAILURE,
        }
    }

    /// Short machine-readable tag for the envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Request(_) => "invalid_request",
            Self::Schema(err) if err.is_not_found() => "schema_not_found",
            Self::Schema(_) => "schema",
            Self::Lint(_) => "lint",
            Self::Credentials(_) => "credentials",
            Self::Transport(err) => err.kind(),
            Self::UnknownEntity { .. } => "unknown_entity",
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;

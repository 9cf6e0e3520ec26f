//! Result envelopes and their rendering

use ads_lint::LintIssue;
use ads_transport::{ClassifiedError, Paging, RateLimitInfo};
use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use thiserror::Error;

use crate::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    Yaml,
    /// Human-readable summary
    Text,
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to serialize output: {0}")]
    Serialize(String),
}

/// What every command prints on stdout, success or failure
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub command: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paging: Option<Paging>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// The `error` member. API failures carry the classified fields verbatim.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Api {
        kind: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        attempts: Option<u32>,
        #[serde(flatten)]
        error: ClassifiedError,
    },
    General {
        kind: &'static str,
        message: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        issues: Vec<LintIssue>,
    },
}

impl ErrorBody {
    pub fn from_error(err: &CliError) -> Self {
        if let CliError::Transport(transport) = err {
            if let Some(classified) = transport.classified() {
                let attempts = match transport {
                    ads_transport::TransportError::RetryExhausted { attempts, .. } => {
                        Some(*attempts)
                    }
                    _ => None,
                };
                return Self::Api {
                    kind: transport.kind(),
                    attempts,
                    error: classified.clone(),
                };
            }
        }
        let issues = match err {
            CliError::Lint(lint) => lint.issues().to_vec(),
            _ => Vec::new(),
        };
        Self::General {
            kind: err.kind(),
            message: err.to_string(),
            issues,
        }
    }
}

impl Envelope {
    pub fn success(command: &str, data: Value) -> Self {
        Self {
            command: command.to_string(),
            success: true,
            data: Some(data),
            error: None,
            paging: None,
            rate_limit: None,
            warnings: Vec::new(),
        }
    }

    pub fn failure(command: &str, err: &CliError) -> Self {
        Self {
            command: command.to_string(),
            success: false,
            data: None,
            error: Some(ErrorBody::from_error(err)),
            paging: None,
            rate_limit: None,
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_paging(mut self, paging: Option<Paging>) -> Self {
        self.paging = paging;
        self
    }

    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: Option<RateLimitInfo>) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    #[must_use]
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

/// Serializes envelopes in the selected format.
pub struct EnvelopeWriter<W: Write> {
    out: W,
    format: OutputFormat,
}

impl<W: Write> EnvelopeWriter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    pub fn write(&mut self, envelope: &Envelope) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut self.out, envelope)
                    .map_err(|e| OutputError::Serialize(e.to_string()))?;
                writeln!(self.out)?;
            }
            OutputFormat::Yaml => {
                let text = serde_yaml::to_string(envelope)
                    .map_err(|e| OutputError::Serialize(e.to_string()))?;
                self.out.write_all(text.as_bytes())?;
            }
            OutputFormat::Text => self.write_text(envelope)?,
        }
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_text(&mut self, envelope: &Envelope) -> Result<(), OutputError> {
        for warning in &envelope.warnings {
            writeln!(self.out, "warning: {warning}")?;
        }

        if let Some(error) = &envelope.error {
            return self.write_error_text(&envelope.command, error);
        }

        if let Some(data) = &envelope.data {
            let pretty = serde_json::to_string_pretty(data)
                .map_err(|e| OutputError::Serialize(e.to_string()))?;
            writeln!(self.out, "{pretty}")?;
        }
        if let Some(next) = envelope.paging.as_ref().and_then(Paging::next_cursor) {
            writeln!(self.out, "more results: {}", next.as_str())?;
        }
        Ok(())
    }

    fn write_error_text(&mut self, command: &str, error: &ErrorBody) -> Result<(), OutputError> {
        match error {
            ErrorBody::Api {
                attempts, error, ..
            } => {
                writeln!(self.out, "{command} failed: {error}")?;
                if let Some(attempts) = attempts {
                    writeln!(self.out, "  attempts: {attempts}")?;
                }
                writeln!(self.out, "  retryable: {}", error.retryable)?;
                if let Some(remediation) = &error.remediation {
                    writeln!(self.out, "  {}", remediation.summary)?;
                    if !remediation.fields.is_empty() {
                        writeln!(self.out, "  fields: {}", remediation.fields.join(", "))?;
                    }
                    for (n, action) in remediation.actions.iter().enumerate() {
                        writeln!(self.out, "  {}. {action}", n + 1)?;
                    }
                }
            }
            ErrorBody::General {
                message, issues, ..
            } => {
                writeln!(self.out, "{command} failed: {message}")?;
                for issue in issues {
                    writeln!(self.out, "  {issue}")?;
                }
            }
        }
        Ok(())
    }
}

//! Classified API errors

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Remediation bucket for an API failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationCategory {
    NotFound,
    Permission,
    Validation,
    RateLimit,
    Unknown,
}

impl RemediationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Permission => "permission",
            Self::Validation => "validation",
            Self::RateLimit => "rate_limit",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RemediationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user can do about a failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remediation {
    pub category: RemediationCategory,
    /// One-line summary of the failure class
    pub summary: String,
    /// Suggested next steps, most likely fix first
    pub actions: Vec<String>,
    /// Request fields or params implicated by the error
    pub fields: Vec<String>,
}

/// An API failure parsed from the error envelope and tagged with a
/// remediation category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub code: i64,
    pub error_subcode: Option<i64>,
    /// HTTP status of the response
    pub status: u16,
    pub message: String,
    /// Opaque trace id to quote when contacting API support
    pub fbtrace_id: Option<String>,
    pub retryable: bool,
    pub remediation: Option<Remediation>,
    /// Everything else the envelope carried, plus request context
    pub diagnostics: BTreeMap<String, serde_json::Value>,
}

impl ClassifiedError {
    /// Remediation category, `unknown` when none was attached.
    pub fn category(&self) -> RemediationCategory {
        self.remediation
            .as_ref()
            .map_or(RemediationCategory::Unknown, |r| r.category)
    }

    /// Implicated field names, if any.
    pub fn fields(&self) -> &[String] {
        self.remediation
            .as_ref()
            .map_or(&[][..], |r| r.fields.as_slice())
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (#{}{}, HTTP {}, {}): {}",
            self.error_type,
            self.code,
            self.error_subcode
                .map(|s| format!("/{s}"))
                .unwrap_or_default(),
            self.status,
            self.category(),
            self.message
        )?;
        if let Some(trace) = &self.fbtrace_id {
            write!(f, " [trace {trace}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for ClassifiedError {}

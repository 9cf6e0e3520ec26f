//! Lint results

use ads_core::RequestSpec;
use serde::Serialize;
use std::fmt;

/// Machine-readable kind of a lint issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    /// Requested read field is not exposed by the entity
    UnknownField,
    /// Parameter is not accepted by the endpoint
    UnknownParam,
    /// Parameter is accepted but deprecated
    DeprecatedParam,
    /// The pack says nothing about the entity or endpoint
    NoSchemaCoverage,
}

impl IssueCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownField => "UNKNOWN_FIELD",
            Self::UnknownParam => "UNKNOWN_PARAM",
            Self::DeprecatedParam => "DEPRECATED_PARAM",
            Self::NoSchemaCoverage => "NO_SCHEMA_COVERAGE",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding, with the offending name and where it was checked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintIssue {
    pub code: IssueCode,
    /// Offending field or parameter; empty for coverage issues
    pub name: String,
    /// Entity or endpoint key the name was checked against
    pub context: String,
    /// Self-contained human readable message
    pub message: String,
}

impl LintIssue {
    pub fn unknown_field(field: &str, entity: &str, pack: &str) -> Self {
        Self {
            code: IssueCode::UnknownField,
            name: field.to_string(),
            context: entity.to_string(),
            message: format!("Field '{field}' is not readable on entity '{entity}' ({pack})"),
        }
    }

    pub fn unknown_param(param: &str, endpoint: &str, pack: &str) -> Self {
        Self {
            code: IssueCode::UnknownParam,
            name: param.to_string(),
            context: endpoint.to_string(),
            message: format!(
                "Parameter '{param}' is not accepted by endpoint '{endpoint}' ({pack})"
            ),
        }
    }

    pub fn deprecated_param(param: &str, endpoint: &str, pack: &str) -> Self {
        Self {
            code: IssueCode::DeprecatedParam,
            name: param.to_string(),
            context: endpoint.to_string(),
            message: format!(
                "Parameter '{param}' is deprecated on endpoint '{endpoint}' ({pack})"
            ),
        }
    }

    pub fn no_coverage(context: &str, pack: &str, unchecked: &str) -> Self {
        Self {
            code: IssueCode::NoSchemaCoverage,
            name: String::new(),
            context: context.to_string(),
            message: format!("Schema pack {pack} has no entry for {context}; {unchecked} not checked"),
        }
    }
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Outcome of linting one request. Empty `errors` means it may be sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LintResult {
    pub errors: Vec<LintIssue>,
    pub warnings: Vec<LintIssue>,
}

impl LintResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, issue: LintIssue) {
        self.errors.push(issue);
    }

    pub fn add_warning(&mut self, issue: LintIssue) {
        self.warnings.push(issue);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// No errors and no warnings
    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|i| i.message.clone()).collect()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(|i| i.message.clone()).collect()
    }

    /// Turn blocking errors into [`crate::Error::Violations`], keeping the
    /// result (and its warnings) when the request may proceed.
    pub fn into_result(self, spec: &RequestSpec) -> crate::Result<Self> {
        if self.has_errors() {
            return Err(crate::Error::Violations {
                method: spec.method().to_string(),
                path: spec.path().to_string(),
                issues: self.errors,
            });
        }
        Ok(self)
    }
}

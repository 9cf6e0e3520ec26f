#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # ads-lint
//!
//! Static validation of outgoing requests against a schema pack, run before
//! any network call.
//!
//! Unknown fields and parameters are errors in strict mode and warnings
//! otherwise. Deprecated parameters are always warnings.
//!
//! ## Example Usage
//!
//! ```rust
//! use ads_core::{HttpMethod, RequestSpec};
//! use ads_lint::LintEngine;
//! use ads_schema::SchemaPack;
//!
//! let pack = SchemaPack::new("marketing", "v21.0")
//!     .with_endpoint("ad.post", ["name", "adset_id", "status", "creative"]);
//!
//! let spec = RequestSpec::new(HttpMethod::Post, "act_0/ads")
//!     .unwrap()
//!     .with_param("name", "Spring sale")
//!     .with_param("bid_cap", "100");
//!
//! let result = LintEngine::new(true).lint(&pack, &spec);
//! assert_eq!(result.errors.len(), 1);
//! assert!(result.errors[0].message.contains("bid_cap"));
//! ```

pub mod engine;
pub mod report;
pub mod rules;

pub use engine::{LintConfig, LintEngine};
pub use report::{IssueCode, LintIssue, LintResult};

use thiserror::Error;

/// Errors produced by linting
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// One or more blocking violations; the request must not be sent
    #[error("{method} {path} failed schema lint ({} violation(s)): {}", .issues.len(), join_messages(.issues))]
    Violations {
        method: String,
        path: String,
        issues: Vec<LintIssue>,
    },
}

impl Error {
    /// The blocking issues carried by this error.
    pub fn issues(&self) -> &[LintIssue] {
        match self {
            Self::Violations { issues, .. } => issues,
        }
    }
}

fn join_messages(issues: &[LintIssue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;

/// Lint `spec` against `pack` with the given strictness.
pub fn lint(
    pack: &ads_schema::SchemaPack,
    spec: &ads_core::RequestSpec,
    strict: bool,
) -> LintResult {
    LintEngine::new(strict).lint(pack, spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ads_core::{HttpMethod, RequestSpec};
    use ads_schema::SchemaPack;

    #[test]
    fn test_convenience_lint() {
        let pack = SchemaPack::new("marketing", "v21.0").with_entity("ad", ["id", "name"]);
        let spec = RequestSpec::new(HttpMethod::Get, "act_0/ads")
            .unwrap()
            .with_fields(["id", "name"]);

        let result = lint(&pack, &spec, true);
        assert!(result.is_clean());
    }

    #[test]
    fn test_violation_error_lists_every_issue() {
        let pack = SchemaPack::new("marketing", "v21.0").with_entity("ad", ["id"]);
        let spec = RequestSpec::new(HttpMethod::Get, "act_0/ads")
            .unwrap()
            .with_fields(["spend", "reach"]);

        let err = lint(&pack, &spec, true)
            .into_result(&spec)
            .unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("GET act_0/ads failed schema lint (2 violation(s))"));
        assert!(text.contains("'spend'"));
        assert!(text.contains("'reach'"));
        assert_eq!(err.issues().len(), 2);
    }
}

//! Lint engine

use ads_core::RequestSpec;
use ads_schema::SchemaPack;
use tracing::{debug, trace};

use crate::report::{LintIssue, LintResult};
use crate::rules::{listed, resolve_endpoint, resolve_entity};

/// Lint configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LintConfig {
    /// Unknown fields and params block the request instead of warning
    pub strict: bool,
}

/// Validates request descriptions against a schema pack.
///
/// Pure: the result depends only on the pack, the request and the config.
/// Issues are emitted in the order the caller supplied fields and params.
#[derive(Debug, Clone, Default)]
pub struct LintEngine {
    config: LintConfig,
}

impl LintEngine {
    pub fn new(strict: bool) -> Self {
        Self::with_config(LintConfig { strict })
    }

    pub fn with_config(config: LintConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> LintConfig {
        self.config
    }

    /// Lint one request.
    pub fn lint(&self, pack: &SchemaPack, spec: &RequestSpec) -> LintResult {
        let mut result = LintResult::new();
        let pack_name = pack.key().to_string();

        let Some(segment) = spec.entity_segment() else {
            // object-id paths (`120330000`, `act_0`) have no pack entry
            if !spec.fields().is_empty() || !spec.params().is_empty() {
                let endpoint = format!("{}.{}", spec.path(), spec.method().verb());
                let issues = spec
                    .fields()
                    .iter()
                    .map(|f| LintIssue::unknown_field(f, spec.path(), &pack_name))
                    .chain(
                        spec.params()
                            .iter()
                            .map(|(p, _)| LintIssue::unknown_param(p, &endpoint, &pack_name)),
                    )
                    .collect();
                let coverage = LintIssue::no_coverage(
                    &format!("object path '{}'", spec.path()),
                    &pack_name,
                    "fields and params were",
                );
                self.uncovered(&mut result, coverage, issues);
            }
            return result;
        };

        if !spec.fields().is_empty() {
            self.lint_fields(pack, &pack_name, segment, spec, &mut result);
        }
        if !spec.params().is_empty() {
            self.lint_params(pack, &pack_name, segment, spec, &mut result);
        }

        debug!(
            "Linted {} {}: {} error(s), {} warning(s)",
            spec.method(),
            spec.path(),
            result.errors.len(),
            result.warnings.len()
        );
        result
    }

    fn lint_fields(
        &self,
        pack: &SchemaPack,
        pack_name: &str,
        segment: &str,
        spec: &RequestSpec,
        result: &mut LintResult,
    ) {
        let entity = resolve_entity(pack, segment);
        let Some(allowed) = pack.entity_fields(&entity) else {
            let issues = spec
                .fields()
                .iter()
                .map(|f| LintIssue::unknown_field(f, &entity, pack_name))
                .collect();
            let coverage =
                LintIssue::no_coverage(&format!("entity '{entity}'"), pack_name, "read fields were");
            self.uncovered(result, coverage, issues);
            return;
        };

        for field in spec.fields() {
            if !listed(Some(allowed), field) {
                trace!("Unknown field {} on {}", field, entity);
                self.violation(result, LintIssue::unknown_field(field, &entity, pack_name));
            }
        }
    }

    fn lint_params(
        &self,
        pack: &SchemaPack,
        pack_name: &str,
        segment: &str,
        spec: &RequestSpec,
        result: &mut LintResult,
    ) {
        let endpoint = resolve_endpoint(pack, segment, spec.method());
        let allowed = pack.endpoint_params(&endpoint);
        let deprecated = pack.deprecated_params(&endpoint);

        if allowed.is_none() && deprecated.is_none() {
            let issues = spec
                .params()
                .iter()
                .map(|(p, _)| LintIssue::unknown_param(p, &endpoint, pack_name))
                .collect();
            let coverage = LintIssue::no_coverage(
                &format!("endpoint '{endpoint}'"),
                pack_name,
                "parameters were",
            );
            self.uncovered(result, coverage, issues);
            return;
        }

        for (param, _) in spec.params() {
            if listed(deprecated, param) {
                result.add_warning(LintIssue::deprecated_param(param, &endpoint, pack_name));
            } else if !listed(allowed, param) {
                trace!("Unknown param {} on {}", param, endpoint);
                self.violation(result, LintIssue::unknown_param(param, &endpoint, pack_name));
            }
        }
    }

    /// Nothing is declared for the entity or endpoint, so every requested
    /// name is undeclared. Strict reports each one; lenient summarises.
    fn uncovered(&self, result: &mut LintResult, coverage: LintIssue, issues: Vec<LintIssue>) {
        if self.config.strict {
            for issue in issues {
                result.add_error(issue);
            }
        } else {
            result.add_warning(coverage);
        }
    }

    fn violation(&self, result: &mut LintResult, issue: LintIssue) {
        if self.config.strict {
            result.add_error(issue);
        } else {
            result.add_warning(issue);
        }
    }
}

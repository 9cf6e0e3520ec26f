//! Immutable request description

use crate::method::HttpMethod;
use crate::{Error, Result};

/// An outgoing API request as described by a command.
///
/// Built once with the consuming `with_*` methods, then only read. Param
/// order is the caller's insertion order; setting a key twice replaces the
/// earlier value in place so lint output stays aligned with input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    method: HttpMethod,
    path: String,
    params: Vec<(String, String)>,
    fields: Vec<String>,
}

impl RequestSpec {
    /// Create a request for `path` (leading and trailing `/` are dropped).
    pub fn new(method: HttpMethod, path: impl AsRef<str>) -> Result<Self> {
        let raw = path.as_ref();
        let trimmed = raw.trim().trim_matches('/');

        if trimmed.is_empty() {
            return Err(Error::invalid_path(raw, "path is empty"));
        }
        if trimmed.contains("://") {
            return Err(Error::invalid_path(
                raw,
                "expected a path relative to the API version, not a URL",
            ));
        }
        if trimmed.contains('?') {
            return Err(Error::invalid_path(
                raw,
                "query strings are not allowed; pass --param instead",
            ));
        }
        if trimmed.split('/').any(str::is_empty) {
            return Err(Error::invalid_path(raw, "path contains an empty segment"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(Error::invalid_path(raw, "path contains whitespace"));
        }

        Ok(Self {
            method,
            path: trimmed.to_string(),
            params: Vec::new(),
            fields: Vec::new(),
        })
    }

    /// Add or replace a parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => self.params.push((key, value)),
        }
        self
    }

    /// Add several parameters in order.
    #[must_use]
    pub fn with_params<I, K, V>(self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        params
            .into_iter()
            .fold(self, |spec, (k, v)| spec.with_param(k, v))
    }

    /// Append requested read fields, skipping duplicates.
    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            let field = field.into();
            if !self.fields.contains(&field) {
                self.fields.push(field);
            }
        }
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Look up a parameter value by name.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Collection segment the request targets, e.g. `ads` for `act_0/ads`.
    pub fn entity_segment(&self) -> Option<&str> {
        entity_segment(&self.path)
    }

    /// Singular entity name, e.g. `ad` for `act_0/ads`.
    pub fn entity(&self) -> Option<String> {
        self.entity_segment().map(singularize)
    }

    /// Schema endpoint key `<entity>.<verb>`, e.g. `ad.post`.
    pub fn endpoint_key(&self) -> Option<String> {
        self.entity()
            .map(|entity| format!("{entity}.{}", self.method.verb()))
    }

    pub fn is_mutation(&self) -> bool {
        self.method.is_mutation()
    }
}

/// Trailing collection segment of a path, or `None` when the path ends in
/// an object id (`120330000`, `act_42`, `me`).
pub fn entity_segment(path: &str) -> Option<&str> {
    let last = path.trim_matches('/').rsplit('/').next()?;
    if last.is_empty() || is_object_id(last) {
        None
    } else {
        Some(last)
    }
}

fn is_object_id(segment: &str) -> bool {
    if segment == "me" {
        return true;
    }
    let digits = segment.strip_prefix("act_").unwrap_or(segment);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Naive English singular used for collection names (`ads` → `ad`,
/// `activities` → `activity`).
pub fn singularize(segment: &str) -> String {
    if let Some(stem) = segment.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }
    if segment.ends_with("ss") {
        return segment.to_string();
    }
    match segment.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => segment.to_string(),
    }
}

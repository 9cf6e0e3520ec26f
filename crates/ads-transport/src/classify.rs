//! Error envelope parsing and classification

use ads_core::RequestSpec;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{debug, trace};

use crate::error::{ClassifiedError, Remediation, RemediationCategory};
use crate::remediation::{actions, categorize, summary};

/// Longest slice of an unparsable body kept in the synthesized message
const BODY_PREVIEW_CHARS: usize = 200;

static PARAM_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bparam(?:eter)?s?\s+['`\x22]?([a-z_][a-z0-9_.\[\]]*)")
        .expect("param pattern is valid")
});
static FIELD_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfield\s+['`\x22]?([a-z_][a-z0-9_.]*)").expect("field pattern is valid")
});
static MUST_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(#\d+\)\s+([a-z_][a-z0-9_]*)\s+(?:must|is required|should)")
        .expect("must pattern is valid")
});
static OBJECT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)object with id '([^']+)'").expect("id pattern is valid")
});

/// Words the name patterns pick up from prose rather than from a request
const STOPWORDS: [&str; 8] = ["is", "the", "a", "an", "must", "value", "for", "you"];

/// Request context that sharpens field attribution.
#[derive(Debug, Clone, Default)]
pub struct ClassifyContext {
    pub path: Option<String>,
    pub params: Vec<(String, String)>,
}

impl ClassifyContext {
    pub fn from_spec(spec: &RequestSpec) -> Self {
        Self {
            path: Some(spec.path().to_string()),
            params: spec.params().to_vec(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Envelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    error_subcode: Option<i64>,
    #[serde(default)]
    fbtrace_id: Option<String>,
    #[serde(default)]
    is_transient: Option<bool>,
    #[serde(default)]
    error_user_title: Option<String>,
    #[serde(default)]
    error_user_msg: Option<String>,
    #[serde(default)]
    error_data: Option<Value>,
}

/// Turns non-2xx responses into [`ClassifiedError`]s.
///
/// Stateless; never panics on malformed input. A body that is not an error
/// envelope is classified from the HTTP status alone and kept in
/// `diagnostics.raw_body`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, status: u16, body: &str) -> ClassifiedError {
        self.classify_with_context(status, body, &ClassifyContext::default())
    }

    pub fn classify_with_context(
        &self,
        status: u16,
        body: &str,
        context: &ClassifyContext,
    ) -> ClassifiedError {
        let mut diagnostics = BTreeMap::new();
        diagnostics.insert("http_status".to_string(), Value::from(status));
        if let Some(path) = &context.path {
            diagnostics.insert("path".to_string(), Value::from(path.as_str()));
        }

        let parsed = serde_json::from_str::<Envelope>(body)
            .ok()
            .and_then(|envelope| envelope.error);

        let Some(err) = parsed else {
            debug!("Unparsable error body for HTTP {}", status);
            diagnostics.insert("raw_body".to_string(), Value::from(body));
            let (category, retryable) = categorize(0, None, status, false);
            return ClassifiedError {
                error_type: "UnparsedResponse".to_string(),
                code: 0,
                error_subcode: None,
                status,
                message: unparsed_message(status, body),
                fbtrace_id: None,
                retryable,
                remediation: Some(remediation(category, 0, retryable, Vec::new())),
                diagnostics,
            };
        };

        let code = err.code.unwrap_or(0);
        let is_transient = err.is_transient.unwrap_or(false);
        let (category, retryable) = categorize(code, err.error_subcode, status, is_transient);
        let message = err
            .message
            .unwrap_or_else(|| format!("HTTP {status} with no error message"));

        let error_data = err.error_data.map(decode_error_data);
        let fields = implicated_fields(&message, category, error_data.as_ref(), context);
        trace!("Classified #{} as {} with fields {:?}", code, category, fields);

        if let Some(title) = err.error_user_title {
            diagnostics.insert("error_user_title".to_string(), Value::from(title));
        }
        if let Some(msg) = err.error_user_msg {
            diagnostics.insert("error_user_msg".to_string(), Value::from(msg));
        }
        if err.is_transient.is_some() {
            diagnostics.insert("is_transient".to_string(), Value::from(is_transient));
        }
        if let Some(data) = error_data {
            diagnostics.insert("error_data".to_string(), data);
        }

        ClassifiedError {
            error_type: err.error_type.unwrap_or_else(|| "UnknownError".to_string()),
            code,
            error_subcode: err.error_subcode,
            status,
            message,
            fbtrace_id: err.fbtrace_id,
            retryable,
            remediation: Some(remediation(category, code, retryable, fields)),
            diagnostics,
        }
    }
}

fn remediation(
    category: RemediationCategory,
    code: i64,
    retryable: bool,
    fields: Vec<String>,
) -> Remediation {
    Remediation {
        category,
        summary: summary(category).to_string(),
        actions: actions(category, code, retryable),
        fields,
    }
}

fn unparsed_message(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("HTTP {status} with empty body");
    }
    let preview: String = trimmed.chars().take(BODY_PREVIEW_CHARS).collect();
    if preview.len() < trimmed.len() {
        format!("HTTP {status}: {preview}...")
    } else {
        format!("HTTP {status}: {preview}")
    }
}

/// `error_data` is sometimes a JSON document encoded as a string.
fn decode_error_data(data: Value) -> Value {
    match data {
        Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        other => other,
    }
}

fn implicated_fields(
    message: &str,
    category: RemediationCategory,
    error_data: Option<&Value>,
    context: &ClassifyContext,
) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        let name = name.trim_end_matches('.');
        if !name.is_empty()
            && !STOPWORDS.contains(&name.to_ascii_lowercase().as_str())
            && !fields.iter().any(|f| f == name)
        {
            fields.push(name.to_string());
        }
    };

    for pattern in [&*PARAM_NAME, &*FIELD_NAME, &*MUST_CLAUSE] {
        for caps in pattern.captures_iter(message) {
            if let Some(name) = caps.get(1) {
                push(name.as_str());
            }
        }
    }

    for (key, _) in &context.params {
        if mentions(message, key) {
            push(key);
        }
    }

    if let Some(specs) = error_data.and_then(|d| d.get("blame_field_specs")) {
        for spec in specs.as_array().into_iter().flatten() {
            match spec {
                Value::Array(parts) => {
                    if let Some(Value::String(first)) = parts.first() {
                        push(first);
                    }
                }
                Value::String(name) => push(name),
                _ => {}
            }
        }
    }

    if category == RemediationCategory::NotFound {
        for caps in OBJECT_ID.captures_iter(message) {
            let Some(id) = caps.get(1) else { continue };
            for (key, value) in &context.params {
                if value == id.as_str() {
                    push(key);
                }
            }
        }
    }

    fields
}

/// Whole-word match of a param name inside a message.
fn mentions(message: &str, name: &str) -> bool {
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    message.match_indices(name).any(|(start, _)| {
        let before = message[..start].chars().next_back();
        let after = message[start + name.len()..].chars().next();
        !before.is_some_and(is_word) && !after.is_some_and(is_word)
    })
}

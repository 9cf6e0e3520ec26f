//! Cursor pagination

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Opaque `paging.next` link for the following page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PagingCursor(pub String);

impl PagingCursor {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the cursor as an absolute URL.
    pub fn to_url(&self) -> Option<Url> {
        Url::parse(&self.0).ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

/// The `paging` block of a list response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursors: Option<Cursors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<PagingCursor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<PagingCursor>,
}

impl Paging {
    /// Extract `paging` from a response payload; `None` when absent or malformed.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        payload
            .get("paging")
            .and_then(|p| serde_json::from_value(p.clone()).ok())
    }

    pub fn next_cursor(&self) -> Option<&PagingCursor> {
        self.next.as_ref().filter(|c| !c.0.is_empty())
    }
}

/// Caller options for following cursors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageOptions {
    /// Stop once this many items have been accumulated
    pub limit: Option<usize>,
}

impl PageOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self { limit: Some(limit) }
    }
}

/// The `data` array of a list response, or the payload itself as a single item.
pub(crate) fn page_items(payload: Value) -> Vec<Value> {
    match payload {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            Some(other) => vec![other],
            None => vec![Value::Object(map)],
        },
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

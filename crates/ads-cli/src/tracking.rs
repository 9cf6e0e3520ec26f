//! Resource tracking for later cleanup

use ads_core::{HttpMethod, RequestSpec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("Resource ledger I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed ledger line {line} in {}: {message}", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Failed to encode ledger entry: {0}")]
    Encode(String),
}

/// A resource created by a command, and how to remove it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedResource {
    /// Entity name, e.g. `adset`
    pub kind: String,
    pub id: String,
    /// Command that reverses the creation, e.g. `DELETE 2385`
    pub cleanup_action: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl TrackedResource {
    /// Describe the object created by a successful POST to a collection.
    ///
    /// Returns `None` for updates (object paths) and responses without an id.
    pub fn from_creation(spec: &RequestSpec, payload: &Value, api_version: &str) -> Option<Self> {
        if spec.method() != HttpMethod::Post {
            return None;
        }
        let kind = spec.entity()?;
        let id = match payload.get("id")? {
            Value::String(id) if !id.is_empty() => id.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };

        let mut metadata = BTreeMap::new();
        metadata.insert("path".to_string(), spec.path().to_string());
        metadata.insert("api_version".to_string(), api_version.to_string());
        if let Some(name) = spec.param("name") {
            metadata.insert("name".to_string(), name.to_string());
        }

        Some(Self {
            kind,
            cleanup_action: format!("DELETE {id}"),
            id,
            metadata,
        })
    }
}

/// Receives every resource a command creates.
pub trait ResourceSink: Send + Sync {
    fn record(&self, resource: &TrackedResource) -> Result<(), TrackingError>;
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ResourceSink for NoopSink {
    fn record(&self, _resource: &TrackedResource) -> Result<(), TrackingError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub resource: TrackedResource,
}

/// Appends one JSON object per line to a ledger file.
#[derive(Debug, Clone)]
pub struct JsonlLedger {
    path: PathBuf,
}

impl JsonlLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries, oldest first. A missing file is an empty ledger.
    pub fn entries(&self) -> Result<Vec<LedgerEntry>, TrackingError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io(e)),
        };

        let mut entries = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| self.io(e))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(&line).map_err(|e| TrackingError::Malformed {
                path: self.path.clone(),
                line: index + 1,
                message: e.to_string(),
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }

    fn io(&self, source: std::io::Error) -> TrackingError {
        TrackingError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ResourceSink for JsonlLedger {
    fn record(&self, resource: &TrackedResource) -> Result<(), TrackingError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io(e))?;
        }

        let entry = LedgerEntry {
            recorded_at: Utc::now(),
            resource: resource.clone(),
        };
        let mut line =
            serde_json::to_string(&entry).map_err(|e| TrackingError::Encode(e.to_string()))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io(e))?;
        file.write_all(line.as_bytes()).map_err(|e| self.io(e))?;

        debug!("Recorded {} {} in {}", resource.kind, resource.id, self.path.display());
        Ok(())
    }
}

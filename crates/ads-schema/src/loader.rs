//! Schema pack loader

use crate::model::{PackKey, SchemaPack};
use crate::registry::PackRegistry;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// File extensions tried, in order, when resolving a pack on disk.
const PACK_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Resolves `(domain, version)` to a parsed [`SchemaPack`].
///
/// Packs are read from `<root>/<domain>/<version>.<ext>` and cached in a
/// shared [`PackRegistry`] for the rest of the process.
#[derive(Debug, Clone)]
pub struct SchemaProvider {
    root: PathBuf,
    registry: Arc<PackRegistry>,
}

impl SchemaProvider {
    /// Create a provider reading packs below `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_registry(Arc::new(PackRegistry::new()), root)
    }

    /// Create a provider sharing an existing cache
    pub fn with_registry(registry: Arc<PackRegistry>, root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            registry,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the pack for `domain`/`version`, loading it on first use.
    pub fn get_pack(&self, domain: &str, version: &str) -> Result<Arc<SchemaPack>> {
        validate_segment("domain", domain)?;
        validate_segment("version", version)?;

        let key = PackKey::new(domain, version);
        if let Some(cached) = self.registry.get(&key) {
            debug!("Cache hit for schema pack: {}", key);
            return Ok(cached);
        }

        trace!("Cache miss for schema pack: {}", key);
        self.registry.get_or_try_load(&key, || self.load_from_disk(&key))
    }

    /// Versions available on disk for a domain, sorted by name.
    pub fn list_versions(&self, domain: &str) -> Result<Vec<String>> {
        validate_segment("domain", domain)?;

        let dir = self.root.join(domain);
        if !dir.is_dir() {
            return Err(Error::DomainNotFound {
                domain: domain.to_string(),
                root: self.root.clone(),
            });
        }

        let entries = std::fs::read_dir(&dir).map_err(|e| Error::io(&dir, e))?;
        let mut versions = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| Error::io(&dir, e))?.path();
            let is_pack = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| PACK_EXTENSIONS.contains(&e));
            if !is_pack || !path.is_file() {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                versions.push(stem.to_string());
            }
        }
        versions.sort();
        versions.dedup();
        Ok(versions)
    }

    /// Keys currently held in the cache.
    pub fn cached_keys(&self) -> Vec<PackKey> {
        self.registry.keys()
    }

    pub fn registry(&self) -> &PackRegistry {
        &self.registry
    }

    /// Load a pack from a specific file, bypassing the cache.
    pub fn load_from_file(&self, path: &Path) -> Result<SchemaPack> {
        trace!("Loading schema pack from file: {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

        let is_yaml = path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml");
        if is_yaml {
            parse_yaml(path, &content)
        } else {
            parse_json(path, &content)
        }
    }

    /// Parse a pack from a JSON string.
    pub fn load_from_json(&self, json: &str) -> Result<SchemaPack> {
        parse_json(Path::new("<inline>"), json)
    }

    /// Parse a pack from a YAML string.
    pub fn load_from_yaml(&self, yaml: &str) -> Result<SchemaPack> {
        parse_yaml(Path::new("<inline>"), yaml)
    }

    fn load_from_disk(&self, key: &PackKey) -> Result<SchemaPack> {
        let dir = self.root.join(&key.domain);

        for ext in PACK_EXTENSIONS {
            let path = dir.join(format!("{}.{ext}", key.version));
            if !path.is_file() {
                continue;
            }

            let pack = self.load_from_file(&path)?;
            let found = pack.key();
            if found != *key {
                return Err(Error::KeyMismatch {
                    path,
                    expected: key.clone(),
                    found,
                });
            }

            info!(
                "Loaded schema pack {} ({} entities, {} endpoints)",
                key,
                pack.entities.len(),
                pack.endpoint_params.len()
            );
            return Ok(pack);
        }

        Err(Error::NotFound {
            domain: key.domain.clone(),
            version: key.version.clone(),
            root: self.root.clone(),
        })
    }
}

impl Default for SchemaProvider {
    fn default() -> Self {
        Self::new("schemas")
    }
}

fn parse_json(path: &Path, content: &str) -> Result<SchemaPack> {
    serde_json::from_str(content)
        .map_err(|e| Error::invalid_format(path, format!("JSON parse error: {e}")))
}

fn parse_yaml(path: &Path, content: &str) -> Result<SchemaPack> {
    serde_yaml::from_str(content)
        .map_err(|e| Error::invalid_format(path, format!("YAML parse error: {e}")))
}

/// Reject keys that would escape the pack root or name nothing.
fn validate_segment(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidKey(format!("{what} is empty")));
    }
    if value == "." || value == ".." || value.contains(['/', '\\']) {
        return Err(Error::InvalidKey(format!(
            "{what} '{value}' must be a single path segment"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const AD_PACK: &str = r#"{
        "domain": "marketing",
        "version": "v21.0",
        "entities": {"ad": ["id", "name", "status", "adset_id", "creative"]},
        "endpoint_params": {"ad.post": ["name", "adset_id", "status", "creative"]},
        "deprecated_params": {"ad.post": ["legacy_param"]}
    }"#;

    fn pack_tree(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    #[test]
    fn test_get_pack_from_disk() {
        let dir = pack_tree(&[("marketing/v21.0.json", AD_PACK)]);
        let provider = SchemaProvider::new(dir.path());

        let pack = provider.get_pack("marketing", "v21.0").unwrap();
        assert_eq!(pack.domain, "marketing");
        assert_eq!(
            pack.entity_fields("ad").unwrap(),
            &["id", "name", "status", "adset_id", "creative"]
        );
    }

    #[test]
    fn test_get_pack_caches_by_key() {
        let dir = pack_tree(&[("marketing/v21.0.json", AD_PACK)]);
        let provider = SchemaProvider::new(dir.path());

        let first = provider.get_pack("marketing", "v21.0").unwrap();
        fs::remove_file(dir.path().join("marketing/v21.0.json")).unwrap();
        let second = provider.get_pack("marketing", "v21.0").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.cached_keys(), vec![PackKey::new("marketing", "v21.0")]);
    }

    #[test]
    fn test_missing_pack_is_not_found() {
        let dir = pack_tree(&[("marketing/v21.0.json", AD_PACK)]);
        let provider = SchemaProvider::new(dir.path());

        match provider.get_pack("marketing", "v1.0").unwrap_err() {
            Error::NotFound { domain, version, .. } => {
                assert_eq!(domain, "marketing");
                assert_eq!(version, "v1.0");
            }
            e => panic!("Expected NotFound error, got {e:?}"),
        }
        assert!(provider.get_pack("audiences", "v21.0").unwrap_err().is_not_found());
    }

    #[test]
    fn test_malformed_pack_carries_path() {
        let dir = pack_tree(&[("marketing/v21.0.json", "{ not json")]);
        let provider = SchemaProvider::new(dir.path());

        match provider.get_pack("marketing", "v21.0").unwrap_err() {
            Error::InvalidFormat { path, .. } => {
                assert!(path.ends_with("marketing/v21.0.json"));
            }
            e => panic!("Expected InvalidFormat error, got {e:?}"),
        }
    }

    #[test]
    fn test_yaml_pack_is_found_after_json() {
        let yaml = "domain: marketing\nversion: v20.0\nentities:\n  ad: [id, name]\n";
        let dir = pack_tree(&[("marketing/v20.0.yaml", yaml)]);
        let provider = SchemaProvider::new(dir.path());

        let pack = provider.get_pack("marketing", "v20.0").unwrap();
        assert_eq!(pack.entity_fields("ad").unwrap(), &["id", "name"]);
        assert!(pack.endpoint_params.is_empty());
    }

    #[test]
    fn test_key_mismatch_is_reported() {
        let dir = pack_tree(&[("marketing/v22.0.json", AD_PACK)]);
        let provider = SchemaProvider::new(dir.path());

        let err = provider.get_pack("marketing", "v22.0").unwrap_err();
        assert!(matches!(err, Error::KeyMismatch { .. }), "got {err:?}");
        assert!(err.to_string().contains("marketing/v21.0"));
    }

    #[test]
    fn test_rejects_path_escaping_keys() {
        let provider = SchemaProvider::default();
        for (domain, version) in [("..", "v1"), ("a/b", "v1"), ("marketing", ""), ("m", "..")] {
            assert!(matches!(
                provider.get_pack(domain, version),
                Err(Error::InvalidKey(_))
            ));
        }
    }

    #[test]
    fn test_list_versions() {
        let dir = pack_tree(&[
            ("marketing/v21.0.json", AD_PACK),
            ("marketing/v20.0.yaml", "domain: marketing\nversion: v20.0\n"),
            ("marketing/README.md", "notes"),
        ]);
        let provider = SchemaProvider::new(dir.path());

        assert_eq!(provider.list_versions("marketing").unwrap(), vec!["v20.0", "v21.0"]);
        assert!(matches!(
            provider.list_versions("audiences"),
            Err(Error::DomainNotFound { .. })
        ));
    }

    #[test]
    fn test_load_from_json_and_yaml_inline() {
        let provider = SchemaProvider::default();
        let from_json = provider.load_from_json(AD_PACK).unwrap();
        let from_yaml = provider
            .load_from_yaml(&serde_yaml::to_string(&from_json).unwrap())
            .unwrap();
        assert_eq!(from_json, from_yaml);

        assert!(matches!(
            provider.load_from_json("[]"),
            Err(Error::InvalidFormat { .. })
        ));
    }
}

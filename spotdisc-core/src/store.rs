//! Flat JSON registries — user-managed name → upstream-id mappings.
//!
//! Two well-known registries exist: the node list (for the price batch
//! collector) and the station list (for trade-result queries). Each is a
//! single JSON document rewritten in full on every mutation; no partial
//! patches, no versioning. A missing or corrupt file loads as an empty
//! registry.

use crate::error::StoreError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A persisted display-name → upstream-identifier registry.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl RegistryStore {
    /// Open (or lazily create) the registry at `path`. Unreadable or
    /// malformed content yields an empty registry rather than an error —
    /// the file is created on the first mutation.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = std::fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        Self { path, entries }
    }

    /// The node registry under the given config dir (or the default one).
    pub fn nodes(config_dir: Option<&Path>) -> Self {
        Self::open(Self::resolve_dir(config_dir).join("nodes.json"))
    }

    /// The station registry under the given config dir (or the default one).
    pub fn stations(config_dir: Option<&Path>) -> Self {
        Self::open(Self::resolve_dir(config_dir).join("stations.json"))
    }

    fn resolve_dir(config_dir: Option<&Path>) -> PathBuf {
        match config_dir {
            Some(dir) => dir.to_path_buf(),
            None => default_config_dir(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn all(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or replace an entry and rewrite the document.
    pub fn set(&mut self, name: impl Into<String>, id: impl Into<String>) -> Result<(), StoreError> {
        self.entries.insert(name.into(), id.into());
        self.save()
    }

    /// Remove an entry and rewrite the document. Returns whether the entry
    /// existed.
    pub fn remove(&mut self, name: &str) -> Result<bool, StoreError> {
        let existed = self.entries.remove(name).is_some();
        if existed {
            self.save()?;
        }
        Ok(existed)
    }

    fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Platform config directory for spotdisc (`~/.config/spotdisc` on Linux).
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("spotdisc")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_through_storage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.json");

        let mut store = RegistryStore::open(&path);
        store.set("alpha", "N1").unwrap();
        store.set("beta", "N2").unwrap();

        let reloaded = RegistryStore::open(&path);
        assert_eq!(reloaded.get("alpha"), Some("N1"));
        assert_eq!(reloaded.get("beta"), Some("N2"));
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn remove_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.json");

        let mut store = RegistryStore::open(&path);
        store.set("alpha", "N1").unwrap();
        assert!(store.remove("alpha").unwrap());
        assert!(!store.remove("alpha").unwrap());

        let reloaded = RegistryStore::open(&path);
        assert!(reloaded.is_empty());
    }

    #[test]
    fn missing_file_loads_empty() {
        let store = RegistryStore::open("/nonexistent/spotdisc/nodes.json");
        assert!(store.is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.json");
        std::fs::write(&path, "not valid json {{{").unwrap();

        let store = RegistryStore::open(&path);
        assert!(store.is_empty());
    }

    #[test]
    fn mutation_rewrites_whole_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.json");

        let mut store = RegistryStore::open(&path);
        store.set("alpha", "N1").unwrap();
        store.set("alpha", "N9").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: BTreeMap<String, String> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed["alpha"], "N9");
    }
}

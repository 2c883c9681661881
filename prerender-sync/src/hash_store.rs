//! Artifact hash store: SHA-256 digests of the last written `{slug}.html`.
//!
//! Persists a `HashStoreFile` JSON document at
//! `<artifacts_dir>/.prerender-hashes.json`, written with the same `.tmp` +
//! rename pattern as the artifacts themselves.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{io_err, SyncError};

pub const STORE_FILE_NAME: &str = ".prerender-hashes.json";

/// Slug → hex digest of the last written artifact.
pub type HashStore = BTreeMap<String, String>;

/// On-disk hash store payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HashStoreFile {
    #[serde(default = "Utc::now")]
    pub synced_at: DateTime<Utc>,
    #[serde(default)]
    pub files: HashStore,
}

impl Default for HashStoreFile {
    fn default() -> Self {
        Self {
            synced_at: Utc::now(),
            files: HashStore::new(),
        }
    }
}

pub fn store_path_at(artifacts_dir: &Path) -> PathBuf {
    artifacts_dir.join(STORE_FILE_NAME)
}

/// Load the hash store kept next to the artifacts.
///
/// Returns an empty store if the file does not yet exist.
pub fn load_at(artifacts_dir: &Path) -> Result<HashStoreFile, SyncError> {
    let path = store_path_at(artifacts_dir);
    if !path.exists() {
        return Ok(HashStoreFile::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    Ok(serde_json::from_str(&contents)?)
}

/// Save the hash store atomically (`<path>.tmp` then rename).
pub fn save_at(artifacts_dir: &Path, store: &HashStoreFile) -> Result<(), SyncError> {
    std::fs::create_dir_all(artifacts_dir).map_err(|e| io_err(artifacts_dir, e))?;

    let path = store_path_at(artifacts_dir);
    let json = serde_json::to_string_pretty(store)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(&path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_store_when_file_missing() {
        let tmp = TempDir::new().unwrap();
        let store = load_at(tmp.path()).unwrap();
        assert!(store.files.is_empty());
    }

    #[test]
    fn roundtrip_save_load() {
        let tmp = TempDir::new().unwrap();
        let mut files = HashStore::new();
        files.insert("best-phones".to_string(), "deadbeef".to_string());
        files.insert("cheap-laptops".to_string(), "cafebabe".to_string());
        let store = HashStoreFile {
            synced_at: Utc::now(),
            files,
        };

        save_at(tmp.path(), &store).unwrap();
        let loaded = load_at(tmp.path()).unwrap();
        assert_eq!(loaded, store);
    }

    #[test]
    fn save_creates_missing_artifacts_dir_and_cleans_tmp() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("public").join("articles");
        save_at(&dir, &HashStoreFile::default()).unwrap();
        assert!(store_path_at(&dir).exists());
        assert!(!store_path_at(&dir).with_extension("json.tmp").exists());
    }

    #[test]
    fn missing_synced_at_defaults_to_now() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            store_path_at(tmp.path()),
            r#"{"files":{"best-phones":"deadbeef"}}"#,
        )
        .unwrap();

        let before = Utc::now();
        let loaded = load_at(tmp.path()).unwrap();
        let after = Utc::now();

        assert_eq!(loaded.files.get("best-phones"), Some(&"deadbeef".to_string()));
        assert!(loaded.synced_at >= before && loaded.synced_at <= after);
    }

    #[test]
    fn corrupt_store_is_a_json_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(store_path_at(tmp.path()), "{not json").unwrap();
        assert!(matches!(load_at(tmp.path()), Err(SyncError::Json(_))));
    }
}

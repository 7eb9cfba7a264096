use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::Snapshot;

/// On-disk form of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSnapshot<T> {
    pub fingerprint: String,
    pub validated_at: DateTime<Utc>,
    pub data: T,
}

impl<T> StoredSnapshot<T> {
    pub fn into_snapshot(self) -> Snapshot<T> {
        Snapshot::new(self.fingerprint, Arc::new(self.data), self.validated_at)
    }
}

#[derive(Serialize)]
struct StoredSnapshotRef<'a, T> {
    fingerprint: &'a str,
    validated_at: DateTime<Utc>,
    data: &'a T,
}

/// Latest-snapshot persistence, one JSON file per cache name.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    cache_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory: {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<StoredSnapshot<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let stored: StoredSnapshot<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(stored))
    }

    /// Write via a temp file and rename so readers never see a partial file.
    pub fn save<T: Serialize>(&self, name: &str, snapshot: &Snapshot<T>) -> Result<()> {
        let stored = StoredSnapshotRef {
            fingerprint: snapshot.fingerprint(),
            validated_at: snapshot.validated_at(),
            data: snapshot.data().as_ref(),
        };
        let contents = serde_json::to_string_pretty(&stored)?;

        let path = self.cache_path(name);
        let tmp = self.cache_dir.join(format!("{}.json.tmp", name));
        std::fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write cache file: {}", name))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace cache file: {}", name))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::fingerprint;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path().join("cache")).unwrap();
        let now = Utc::now();
        let snap = Snapshot::new(fingerprint("x"), Arc::new(vec!["Tackle".to_string()]), now);

        store.save("moves_abc", &snap).unwrap();
        let loaded: StoredSnapshot<Vec<String>> = store.load("moves_abc").unwrap().unwrap();

        assert_eq!(loaded.fingerprint, snap.fingerprint());
        assert_eq!(loaded.validated_at, now);
        assert_eq!(loaded.data, vec!["Tackle".to_string()]);
        assert!(!tmp.path().join("cache/moves_abc.json.tmp").exists());
    }

    #[test]
    fn test_load_missing_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path().to_path_buf()).unwrap();
        assert!(store.load::<Vec<String>>("roster").unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt_is_error() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path().to_path_buf()).unwrap();
        std::fs::write(tmp.path().join("roster.json"), "{not json").unwrap();
        assert!(store.load::<Vec<String>>("roster").is_err());
    }
}

//! JSON-array file adapter for the build catalog.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use armory_domain::{Build, BuildId};

use crate::infrastructure::ports::{CatalogStore, StoreError};

/// Whole-file JSON store: one array of build records.
///
/// Mutations are serialized through a single mutex and every rewrite goes
/// through a temp file plus rename, so concurrent wizard commits cannot
/// lose each other's writes and a crash mid-write cannot truncate the
/// catalog.
pub struct JsonCatalogStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonCatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<Build>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            // No file yet means an empty catalog, not an error.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io("read", e)),
        };
        serde_json::from_slice::<Vec<Build>>(&bytes).map_err(StoreError::corrupt)
    }

    async fn write_all(&self, builds: &[Build]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::io("create_dir", e))?;
            }
        }
        let json = serde_json::to_vec_pretty(builds)
            .map_err(|e| StoreError::io("serialize", e))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| StoreError::io("write", e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::io("rename", e))
    }
}

#[async_trait]
impl CatalogStore for JsonCatalogStore {
    async fn load(&self) -> Result<Vec<Build>, StoreError> {
        self.read_all().await
    }

    async fn append(&self, build: &Build) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut builds = self.read_all().await?;
        builds.push(build.clone());
        self.write_all(&builds).await
    }

    async fn delete(&self, id: BuildId) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut builds = self.read_all().await?;
        let before = builds.len();
        builds.retain(|b| b.id != id);
        if builds.len() == before {
            return Ok(false);
        }
        self.write_all(&builds).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use armory_domain::{Category, Mode};

    fn build(name: &str) -> Build {
        let modules: BTreeMap<String, String> = (0..5)
            .map(|i| (format!("Slot {i}"), format!("code-{i}")))
            .collect();
        Build::new(
            name,
            "Mid range",
            Category::Meta,
            Mode::Warzone,
            "assault",
            modules,
            "images/x.jpg",
            "Tester",
        )
        .expect("valid build")
    }

    fn store_in(dir: &tempfile::TempDir) -> JsonCatalogStore {
        JsonCatalogStore::new(dir.path().join("builds.json"))
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        assert!(store.load().await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn append_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);

        let b = build("M4A1");
        store.append(&b).await.expect("append");

        let loaded = store.load().await.expect("load");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.last(), Some(&b));
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);

        let a = build("M4A1");
        let b = build("M4A1"); // same content, distinct id
        store.append(&a).await.expect("append a");
        store.append(&b).await.expect("append b");

        assert!(store.delete(a.id).await.expect("delete"));
        let loaded = store.load().await.expect("load");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, b.id);

        // Deleting again is a no-op.
        assert!(!store.delete(a.id).await.expect("second delete"));
    }

    #[tokio::test]
    async fn malformed_file_is_corrupt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("builds.json");
        std::fs::write(&path, b"{\"not\": \"an array\"}").expect("write");

        let store = JsonCatalogStore::new(path);
        let err = store.load().await.expect_err("must fail");
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}

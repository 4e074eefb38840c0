//! Filesystem adapter for build images.
//!
//! Assets are written once per created build and never mutated. Files are
//! named by build id, so two builds for the same weapon never overwrite
//! each other's image.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::infrastructure::ports::{AssetError, AssetStore};

pub struct FileAssetStore {
    dir: PathBuf,
}

impl FileAssetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl AssetStore for FileAssetStore {
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<String, AssetError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AssetError::Io(e.to_string()))?;
        let path = self.dir.join(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AssetError::Io(e.to_string()))?;
        Ok(path.to_string_lossy().into_owned())
    }

    async fn exists(&self, path: &str) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AssetError::Missing(path.to_string()))
            }
            Err(e) => Err(AssetError::Io(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_read_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileAssetStore::new(dir.path());

        let path = store.save("b1.jpg", b"jpeg-bytes").await.expect("save");
        assert!(store.exists(&path).await);
        assert_eq!(store.read(&path).await.expect("read"), b"jpeg-bytes");
    }

    #[tokio::test]
    async fn missing_asset_degrades() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileAssetStore::new(dir.path());

        let ghost = dir.path().join("nope.jpg").to_string_lossy().into_owned();
        assert!(!store.exists(&ghost).await);
        assert!(matches!(
            store.read(&ghost).await,
            Err(AssetError::Missing(_))
        ));
    }
}

//! Local filesystem object store.
//!
//! Objects are files under a root directory. Writes land in a hidden
//! temporary sibling first and are renamed over the target, so readers
//! never see a half-written collection.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::{ObjectStore, StorageError, with_timeout};

/// Object store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
    timeout: Duration,
}

impl FsObjectStore {
    /// Creates a store rooted at `root`. The directory is created on the
    /// first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            timeout,
        }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path(key);
        let location = path.display().to_string();
        log::debug!("Reading {location}");

        with_timeout("read", &location, self.timeout, async {
            match tokio::fs::read(&path).await {
                Ok(body) => Ok(Some(body)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(StorageError::Read {
                    location: location.clone(),
                    source: Box::new(e),
                }),
            }
        })
        .await
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), StorageError> {
        let path = self.path(key);
        let location = path.display().to_string();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = path.with_file_name(format!(".{file_name}.tmp"));
        log::debug!("Writing {} bytes to {location}", body.len());

        with_timeout("write", &location, self.timeout, async {
            let write_error = |e: std::io::Error| StorageError::Write {
                location: location.clone(),
                source: Box::new(e),
            };

            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
            }
            tokio::fs::write(&tmp, &body).await.map_err(write_error)?;
            tokio::fs::rename(&tmp, &path).await.map_err(write_error)?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!("nuisance_map_fs_store_{name}"));
        let _ = std::fs::remove_dir_all(&root);
        root
    }

    #[tokio::test]
    async fn missing_file_is_none() {
        let root = temp_root("missing");
        let store = FsObjectStore::new(&root, Duration::from_secs(5));
        assert!(store.get("nuisances.csv").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_replaces_whole_object() {
        let root = temp_root("replace");
        let store = FsObjectStore::new(&root, Duration::from_secs(5));

        store.put("nuisances.csv", b"first version".to_vec()).await.unwrap();
        store.put("nuisances.csv", b"second".to_vec()).await.unwrap();

        assert_eq!(
            store.get("nuisances.csv").await.unwrap(),
            Some(b"second".to_vec())
        );
        assert!(!root.join(".nuisances.csv.tmp").exists());

        let _ = std::fs::remove_dir_all(&root);
    }
}

//! Filesystem-backed document store
//!
//! Paths are joined onto the root as given. An absolute path or `..`
//! component therefore escapes the root; callers that want containment must
//! reject such paths before they get here.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;

use super::{DocumentStore, Entry, EntryKind};
use crate::error::StoreError;

pub struct LocalDiskStore {
    root: PathBuf,
}

impl LocalDiskStore {
    /// Create a store rooted at `root`, which must be an existing directory
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let meta = std::fs::metadata(&root).map_err(|e| StoreError::io(&root, e))?;
        if !meta.is_dir() {
            return Err(StoreError::io(
                &root,
                io::Error::other("served root must be a directory"),
            ));
        }
        Ok(Self { root })
    }

    fn file_path(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

#[async_trait]
impl DocumentStore for LocalDiskStore {
    async fn read(&self, path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.file_path(path)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        // Parent directories are not created: writing under a missing
        // directory is an error, not an implicit mkdir.
        fs::write(self.file_path(path), bytes)
            .await
            .map_err(|e| StoreError::io(path, e))
    }

    async fn stat(&self, path: &Path) -> Result<Option<Entry>, StoreError> {
        let meta = match fs::metadata(self.file_path(path)).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };

        let kind = if meta.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        Ok(Some(Entry {
            kind,
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, LocalDiskStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDiskStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_root_must_be_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();

        assert!(LocalDiskStore::new(&file).is_err());
        assert!(LocalDiskStore::new(dir.path().join("missing")).is_err());
    }

    #[tokio::test]
    async fn test_read_missing_is_none() {
        let (_dir, store) = store();
        let result = store.read(Path::new("data.json")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let (dir, store) = store();
        store
            .write(Path::new("data.json"), b"{\"a\": 1}")
            .await
            .unwrap();

        let bytes = store.read(Path::new("data.json")).await.unwrap().unwrap();
        assert_eq!(bytes, b"{\"a\": 1}");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("data.json")).unwrap(),
            "{\"a\": 1}"
        );
    }

    #[tokio::test]
    async fn test_write_truncates() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("data.json"), "[1, 2, 3, 4, 5, 6]").unwrap();

        store.write(Path::new("data.json"), b"[]").await.unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("data.json")).unwrap(),
            "[]"
        );
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails() {
        let (_dir, store) = store();
        let err = store
            .write(Path::new("nope/data.json"), b"[]")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nope/data.json"));
    }

    #[tokio::test]
    async fn test_read_directory_is_error() {
        let (dir, store) = store();
        std::fs::create_dir(dir.path().join("folder.json")).unwrap();
        assert!(store.read(Path::new("folder.json")).await.is_err());
    }

    #[tokio::test]
    async fn test_stat_kinds() {
        let (dir, store) = store();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/app.js"), "let x = 1;").unwrap();

        let d = store.stat(Path::new("assets")).await.unwrap().unwrap();
        assert!(d.is_dir());

        let f = store.stat(Path::new("assets/app.js")).await.unwrap().unwrap();
        assert_eq!(f.kind, EntryKind::File);
        assert!(f.modified.is_some());

        assert!(store.stat(Path::new("assets/none.js")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_parent_dir_escapes_root() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().join("www");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(outer.path().join("secret.json"), "{\"k\": true}").unwrap();

        let store = LocalDiskStore::new(&root).unwrap();
        let bytes = store.read(Path::new("../secret.json")).await.unwrap();
        assert_eq!(bytes.as_deref(), Some(&b"{\"k\": true}"[..]));
    }
}

//! In-memory document store
//!
//! Mirrors the disk store's observable behavior closely enough for handler
//! tests: directories exist implicitly above stored files, reading a
//! directory fails, and writing below a missing directory fails.

use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{DocumentStore, Entry, EntryKind};
use crate::error::StoreError;

#[derive(Debug, Clone)]
struct StoredFile {
    bytes: Vec<u8>,
    modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    files: RwLock<BTreeMap<PathBuf, StoredFile>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with files. Parent directories are
    /// implied by the file paths.
    pub fn with_files<I, P, B>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, B)>,
        P: AsRef<Path>,
        B: Into<Vec<u8>>,
    {
        let now = Utc::now();
        let files = files
            .into_iter()
            .map(|(path, bytes)| {
                (
                    normalize(path.as_ref()),
                    StoredFile {
                        bytes: bytes.into(),
                        modified: now,
                    },
                )
            })
            .collect();
        Self {
            files: RwLock::new(files),
        }
    }

    /// Current contents at `path`, bypassing the store API
    pub async fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let files = self.files.read().await;
        files.get(&normalize(path.as_ref())).map(|f| f.bytes.clone())
    }
}

/// Resolve `.` and `..` lexically so lookups are stable
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    out
}

fn is_dir(files: &BTreeMap<PathBuf, StoredFile>, path: &Path) -> bool {
    path.as_os_str().is_empty()
        || files
            .keys()
            .any(|key| key != path && key.starts_with(path))
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn read(&self, path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
        let key = normalize(path);
        let files = self.files.read().await;
        if let Some(file) = files.get(&key) {
            return Ok(Some(file.bytes.clone()));
        }
        if is_dir(&files, &key) {
            return Err(StoreError::io(path, io::Error::other("Is a directory")));
        }
        Ok(None)
    }

    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let key = normalize(path);
        let mut files = self.files.write().await;

        if is_dir(&files, &key) {
            return Err(StoreError::io(path, io::Error::other("Is a directory")));
        }
        let parent = key.parent().unwrap_or_else(|| Path::new(""));
        if !is_dir(&files, parent) {
            return Err(StoreError::io(
                path,
                io::Error::from(io::ErrorKind::NotFound),
            ));
        }

        files.insert(
            key,
            StoredFile {
                bytes: bytes.to_vec(),
                modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn stat(&self, path: &Path) -> Result<Option<Entry>, StoreError> {
        let key = normalize(path);
        let files = self.files.read().await;

        if let Some(file) = files.get(&key) {
            return Ok(Some(Entry {
                kind: EntryKind::File,
                modified: Some(file.modified),
            }));
        }
        if is_dir(&files, &key) {
            return Ok(Some(Entry {
                kind: EntryKind::Directory,
                modified: None,
            }));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_implicit_directories() {
        let store = InMemoryStore::with_files([("site/css/main.css", "body {}")]);

        let site = store.stat(Path::new("site")).await.unwrap().unwrap();
        assert!(site.is_dir());
        let css = store.stat(Path::new("site/css")).await.unwrap().unwrap();
        assert!(css.is_dir());
        let file = store.stat(Path::new("site/css/main.css")).await.unwrap().unwrap();
        assert_eq!(file.kind, EntryKind::File);

        // "sit" is a string prefix of "site" but not a path prefix
        assert!(store.stat(Path::new("sit")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_requires_parent() {
        let store = InMemoryStore::with_files([("data/a.json", "[]")]);

        store.write(Path::new("data/b.json"), b"{}").await.unwrap();
        store.write(Path::new("top.json"), b"{}").await.unwrap();
        assert!(store.write(Path::new("missing/c.json"), b"{}").await.is_err());
        assert!(store.write(Path::new("data"), b"{}").await.is_err());
    }

    #[tokio::test]
    async fn test_read_directory_fails() {
        let store = InMemoryStore::with_files([("dir.json/inner", "x")]);
        assert!(store.read(Path::new("dir.json")).await.is_err());
        assert!(store.read(Path::new("absent.json")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_contents() {
        let store = InMemoryStore::new();
        store.write(Path::new("data.json"), b"{\"a\": 1}").await.unwrap();
        store.write(Path::new("data.json"), b"{\"b\": 2}").await.unwrap();
        assert_eq!(store.contents("data.json").await.unwrap(), b"{\"b\": 2}");
    }
}

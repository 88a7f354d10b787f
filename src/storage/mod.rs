//! Document storage module
//!
//! The server never touches the filesystem directly. Every read and write
//! goes through a `DocumentStore`, keyed by a path relative to the served
//! directory:
//! - `LocalDiskStore` backs the running server
//! - `InMemoryStore` stands in for it in tests

#[cfg(test)]
mod in_memory;
mod local_disk;

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;

#[cfg(test)]
pub use in_memory::InMemoryStore;
pub use local_disk::LocalDiskStore;

/// Kind of object found at a storage path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Metadata for an existing storage path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub kind: EntryKind,
    /// Last modification time, if the backend tracks one
    pub modified: Option<DateTime<Utc>>,
}

impl Entry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Byte store keyed by relative path.
///
/// `Ok(None)` always means "nothing exists at this path"; every other
/// failure is reported as `StoreError`. Writes replace the whole object and
/// are not atomic.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the full contents stored at `path`
    async fn read(&self, path: &Path) -> Result<Option<Vec<u8>>, StoreError>;

    /// Truncate `path` and write `bytes` into it
    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), StoreError>;

    /// Look up what exists at `path`
    async fn stat(&self, path: &Path) -> Result<Option<Entry>, StoreError>;
}

//! Request path to storage path mapping
//!
//! The request path minus its first `/` is the storage path. Nothing is
//! normalized: `..` segments and a second leading `/` pass straight through
//! to the store unless confinement is switched on.

use std::path::{Component, Path, PathBuf};

use crate::error::DocumentError;

/// Map a request path to the relative path handed to the store
pub fn storage_path(request_path: &str, confine: bool) -> Result<PathBuf, DocumentError> {
    let relative = request_path.strip_prefix('/').unwrap_or(request_path);
    let path = Path::new(relative);

    if confine && escapes_root(path) {
        return Err(DocumentError::Forbidden(request_path.to_string()));
    }
    Ok(path.to_path_buf())
}

fn escapes_root(path: &Path) -> bool {
    path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

//! Logical path normalization and lexical containment checks

use crate::error::StorageError;
use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Normalize a path string for use as a manifest key
///
/// Converts backslashes to forward slashes, normalizes Unicode to NFC and
/// removes trailing slashes (except root).
pub fn normalize_path_string(path: &str) -> String {
    let mut result: String = path.replace('\\', "/").nfc().collect();
    if result.len() > 1 {
        while result.ends_with('/') {
            result.pop();
        }
    }
    result
}

/// Logical path of `path` relative to `root`: `/a/b/c.png`
pub fn logical_path(root: &Path, path: &Path) -> Result<String, StorageError> {
    let relative = path.strip_prefix(root).map_err(|_| {
        StorageError::InvalidPath(format!("{} is not under {}", path.display(), root.display()))
    })?;

    let mut logical = String::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => {
                let name = name.to_str().ok_or_else(|| {
                    StorageError::InvalidPath(format!("non UTF-8 path: {}", path.display()))
                })?;
                logical.push('/');
                logical.push_str(name);
            }
            Component::CurDir => {}
            _ => {
                return Err(StorageError::InvalidPath(format!(
                    "unexpected component in {}",
                    path.display()
                )))
            }
        }
    }

    if logical.is_empty() {
        logical.push('/');
    }
    Ok(normalize_path_string(&logical))
}

/// Resolve an archive entry name under `root` without touching the filesystem
///
/// Rejects absolute names and any `..` that would climb above `root`.
pub fn resolve_within(root: &Path, entry_name: &str) -> Result<PathBuf, StorageError> {
    let invalid = || StorageError::InvalidPath(format!("invalid file path: {}", entry_name));

    let normalized = entry_name.replace('\\', "/");
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(name) => parts.push(name),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(invalid());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(invalid()),
        }
    }

    let mut resolved = root.to_path_buf();
    for part in parts {
        resolved.push(part);
    }
    Ok(resolved)
}

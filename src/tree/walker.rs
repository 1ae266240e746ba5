//! Asset selector: a lazy walk over the extracted asset tree

use crate::error::StorageError;
use crate::tree::path;
use crate::tree::rules::SelectionRules;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, IntoIter, WalkDir};

/// A file eligible for content-addressing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// Absolute location on local storage
    pub path: PathBuf,
    /// Forward-slash path relative to the extraction root, e.g. `/assets/minecraft/a.png`
    pub logical_path: String,
}

/// Single-pass iterator over selected files
///
/// Directories are never yielded. Entries are visited in file-name order at
/// every level so repeated runs over the same tree produce the same sequence.
/// Excluded category directories are pruned without descending into them.
pub struct AssetSelector {
    extract_root: PathBuf,
    asset_root: PathBuf,
    rules: SelectionRules,
    inner: Option<IntoIter>,
}

impl AssetSelector {
    /// Select files under `asset_root`; logical paths are taken relative to `extract_root`
    pub fn new(extract_root: PathBuf, asset_root: PathBuf, rules: SelectionRules) -> Self {
        Self {
            extract_root,
            asset_root,
            rules,
            inner: None,
        }
    }

    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    fn relative<'a>(&self, path: &'a Path) -> Option<&'a Path> {
        path.strip_prefix(&self.asset_root).ok()
    }

    fn select(&self, entry: DirEntry) -> Result<Option<SelectedFile>, StorageError> {
        if !entry.file_type().is_file() {
            return Ok(None);
        }

        let Some(relative) = self.relative(entry.path()) else {
            return Ok(None);
        };
        if self.rules.is_excluded(relative) {
            tracing::debug!(path = %relative.display(), "Excluded by selection rules");
            return Ok(None);
        }

        Ok(Some(SelectedFile {
            path: entry.path().to_path_buf(),
            logical_path: path::logical_path(&self.extract_root, entry.path())?,
        }))
    }
}

impl Iterator for AssetSelector {
    type Item = Result<SelectedFile, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.inner.is_none() {
            self.inner = Some(
                WalkDir::new(&self.asset_root)
                    .follow_links(false)
                    .sort_by_file_name()
                    .into_iter(),
            );
        }

        loop {
            let walker = self.inner.as_mut()?;
            let entry = match walker.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    return Some(Err(StorageError::IoError(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        format!("Failed to walk directory: {}", e),
                    ))))
                }
            };

            if entry.file_type().is_dir() {
                let pruned = entry.depth() == 1
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|n| self.rules.excludes_category(n));
                if pruned {
                    tracing::debug!(category = ?entry.file_name(), "Skipping excluded category");
                    walker.skip_current_dir();
                }
                continue;
            }

            match self.select(entry) {
                Ok(Some(file)) => return Some(Ok(file)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

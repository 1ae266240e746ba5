//! Local content-addressed staging area
//!
//! Objects are staged at `{root}/{hex[0..2]}/{digest}` before upload. Staging is
//! idempotent: identical content always lands at the same path and an existing
//! object is never overwritten.

use crate::digest::{self, DigestHex};
use crate::error::StorageError;
use std::fs;
use std::path::{Path, PathBuf};

/// Working manifest written next to the staged objects once the walk completes.
/// Its presence marks a run that has not yet published.
pub const STAGED_MANIFEST_NAME: &str = "index.json";

/// Result of staging one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedObject {
    pub digest: DigestHex,
    pub path: PathBuf,
    pub length: u64,
    /// False when the object was already staged by an earlier file or run
    pub newly_written: bool,
}

pub struct ObjectStaging {
    root: PathBuf,
}

impl ObjectStaging {
    /// Open (and create if needed) a staging area at `root`
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to create staging directory at {:?}: {}", root, e),
            ))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a staged object: `{root}/{hex[0..2]}/{digest}`
    pub fn object_path(&self, digest: &DigestHex) -> PathBuf {
        let (prefix, name) = digest::storage_path(digest);
        self.root.join(prefix).join(name)
    }

    pub fn exists(&self, digest: &DigestHex) -> bool {
        self.object_path(digest).is_file()
    }

    /// Digest a source file and stage its content
    pub fn stage_file(&self, source: &Path) -> Result<StagedObject, StorageError> {
        let file = fs::File::open(source).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to open {:?}: {}", source, e),
            ))
        })?;
        let digest = digest::digest_reader(std::io::BufReader::new(file))?;
        self.place(&digest, |temp_path| fs::copy(source, temp_path).map(|_| ()))
    }

    /// Stage in-memory content
    pub fn stage_bytes(&self, content: &[u8]) -> Result<StagedObject, StorageError> {
        let digest = digest::digest(content);
        self.place(&digest, |temp_path| fs::write(temp_path, content))
    }

    /// Read a staged object back
    pub fn read(&self, digest: &DigestHex) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(digest);
        fs::read(&path).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to read staged object {:?}: {}", path, e),
            ))
        })
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(STAGED_MANIFEST_NAME)
    }

    /// Atomically replace the staged working manifest
    pub fn write_manifest(&self, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.manifest_path();
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, bytes).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to write staged manifest {:?}: {}", temp_path, e),
            ))
        })?;
        fs::rename(&temp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to rename temp file to {:?}: {}", path, e),
            ))
        })
    }

    /// Staged working manifest, if an unpublished run left one
    pub fn read_manifest(&self) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(self.manifest_path()) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Drop the staged working manifest after it has been published
    pub fn discard_manifest(&self) -> Result<(), StorageError> {
        match fs::remove_file(self.manifest_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the whole staging area
    pub fn remove(self) -> Result<(), StorageError> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write through a temp file and rename into place, unless already present
    fn place<F>(&self, digest: &DigestHex, write: F) -> Result<StagedObject, StorageError>
    where
        F: FnOnce(&Path) -> std::io::Result<()>,
    {
        let object_path = self.object_path(digest);

        if object_path.is_file() {
            // Verify before trusting a leftover from an interrupted run.
            let existing = digest::digest_reader(std::io::BufReader::new(fs::File::open(
                &object_path,
            )?))?;
            if existing != *digest {
                return Err(StorageError::HashMismatch {
                    path: object_path.display().to_string(),
                    expected: digest.clone(),
                    actual: existing,
                });
            }
            let length = fs::metadata(&object_path)?.len();
            return Ok(StagedObject {
                digest: digest.clone(),
                path: object_path,
                length,
                newly_written: false,
            });
        }

        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StorageError::IoError(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create parent directory {:?}: {}", parent, e),
                ))
            })?;
        }

        let temp_path = object_path.with_extension("tmp");
        write(&temp_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to write object to {:?}: {}", temp_path, e),
            ))
        })?;

        fs::rename(&temp_path, &object_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to rename temp file to {:?}: {}", object_path, e),
            ))
        })?;

        let length = fs::metadata(&object_path)?.len();
        Ok(StagedObject {
            digest: digest.clone(),
            path: object_path,
            length,
            newly_written: true,
        })
    }
}

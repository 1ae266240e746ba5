//! Error types for the asset uploader.

use crate::digest::DigestHex;
use std::fmt;
use thiserror::Error;

/// Local storage errors (extraction tree, staging area)
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Hash mismatch at {path}: expected {expected}, got {actual}")]
    HashMismatch {
        path: String,
        expected: DigestHex,
        actual: DigestHex,
    },

    #[error("Invalid digest: {0}")]
    InvalidDigest(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Run-level errors. Every variant is fatal for the current invocation.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Remote store error: {0}")]
    Remote(#[from] object_store::Error),

    #[error("Download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("Download failed: {url} returned HTTP {status}")]
    DownloadStatus { url: String, status: u16 },

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Malformed manifest: {0}")]
    ManifestDecode(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Storage(StorageError::IoError(err))
    }
}

impl From<config::ConfigError> for SyncError {
    fn from(err: config::ConfigError) -> Self {
        SyncError::ConfigError(err.to_string())
    }
}

/// Pipeline stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configure,
    Download,
    Extract,
    LoadBaseline,
    WalkAndStage,
    PublishObjects,
    PublishManifest,
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Configure => "configure",
            Stage::Download => "download",
            Stage::Extract => "extract",
            Stage::LoadBaseline => "load-baseline",
            Stage::WalkAndStage => "walk-and-stage",
            Stage::PublishObjects => "publish-objects",
            Stage::PublishManifest => "publish-manifest",
            Stage::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// A fatal error tagged with the stage that raised it
#[derive(Debug, Error)]
#[error("Stage '{stage}' failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: SyncError,
}

/// Attach a stage to any error convertible into [`SyncError`].
pub trait InStage<T> {
    fn in_stage(self, stage: Stage) -> Result<T, StageError>;
}

impl<T, E: Into<SyncError>> InStage<T> for Result<T, E> {
    fn in_stage(self, stage: Stage) -> Result<T, StageError> {
        self.map_err(|e| StageError {
            stage,
            source: e.into(),
        })
    }
}

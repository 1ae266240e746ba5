//! Version-aware asset manifest (`index.json`)
//!
//! A manifest is an ordered list of entries keyed by `(path, hash)`. Each entry
//! carries the list of version tags that ship that exact content at that path.
//! The baseline manifest loaded at the start of a run is never mutated; the
//! working manifest is built from it one file at a time.

use crate::digest::DigestHex;
use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::Read;

/// One `(path, hash)` pairing and the versions that include it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(rename = "hash")]
    pub digest: DigestHex,
    #[serde(rename = "path")]
    pub logical_path: String,
    pub length: u64,
    #[serde(default)]
    pub versions: Vec<String>,
}

impl ManifestEntry {
    /// Entry seen for the first time, tagged with a single version
    pub fn fresh(digest: DigestHex, logical_path: String, length: u64, version: &str) -> Self {
        Self {
            digest,
            logical_path,
            length,
            versions: vec![version.to_string()],
        }
    }

    pub fn has_version(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }

    fn key(&self) -> (&str, &str) {
        (self.logical_path.as_str(), self.digest.as_str())
    }
}

/// How a working entry relates to the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStatus {
    /// No baseline entry for this `(path, hash)`
    New,
    /// Baseline entry found; the current version was appended
    Extended,
    /// Baseline entry already lists the current version
    AlreadyKnown,
}

/// Result of merging one file into the working manifest
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub entry: ManifestEntry,
    pub status: MergeStatus,
}

/// Ordered manifest with an index on `(path, hash)`
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
    index: HashMap<(String, String), usize>,
}

impl PartialEq for Manifest {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a manifest from its JSON representation
    ///
    /// A JSON `null` document decodes to an empty manifest. Anything else that
    /// is not an array of entries is a decode error.
    pub fn load<R: Read>(reader: R) -> Result<Self, SyncError> {
        let entries: Option<Vec<ManifestEntry>> = serde_json::from_reader(reader)?;
        Ok(Self::from_entries(entries.unwrap_or_default()))
    }

    /// Parse a manifest from bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SyncError> {
        Self::load(bytes)
    }

    pub fn from_entries(entries: Vec<ManifestEntry>) -> Self {
        let mut manifest = Self::new();
        for entry in entries {
            manifest.push(entry);
        }
        manifest
    }

    /// Serialize in insertion order
    pub fn serialize(&self) -> Result<Vec<u8>, SyncError> {
        Ok(serde_json::to_vec(&self.entries)?)
    }

    /// Append an entry, keeping insertion order
    ///
    /// The first entry for a key wins the index slot, so lookups stay stable if
    /// a historical manifest happens to contain duplicate keys.
    pub fn push(&mut self, entry: ManifestEntry) {
        let key = (entry.logical_path.clone(), entry.digest.as_str().to_string());
        let position = self.entries.len();
        self.index.entry(key).or_insert(position);
        self.entries.push(entry);
    }

    /// Find an entry by exact `(path, hash)` match
    pub fn lookup(&self, logical_path: &str, digest: &DigestHex) -> Option<&ManifestEntry> {
        self.index
            .get(&(logical_path.to_string(), digest.as_str().to_string()))
            .map(|&i| &self.entries[i])
    }

    pub fn contains_key(&self, logical_path: &str, digest: &DigestHex) -> bool {
        self.lookup(logical_path, digest).is_some()
    }

    /// Every digest referenced by this manifest
    pub fn digests(&self) -> HashSet<&str> {
        self.entries.iter().map(|e| e.digest.as_str()).collect()
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append baseline entries whose key this manifest has not produced
    ///
    /// Returns the number of entries carried forward.
    pub fn carry_forward(&mut self, baseline: &Manifest) -> usize {
        let mut carried = 0;
        for entry in &baseline.entries {
            let (path, hash) = entry.key();
            if self.index.contains_key(&(path.to_string(), hash.to_string())) {
                continue;
            }
            self.push(entry.clone());
            carried += 1;
        }
        carried
    }
}

/// Extend a baseline entry with the current version tag
///
/// The version list only ever grows; an already present tag leaves the entry
/// unchanged.
pub fn merge(baseline_entry: &ManifestEntry, current_version: &str) -> MergeOutcome {
    if baseline_entry.has_version(current_version) {
        return MergeOutcome {
            entry: baseline_entry.clone(),
            status: MergeStatus::AlreadyKnown,
        };
    }
    let mut entry = baseline_entry.clone();
    entry.versions.push(current_version.to_string());
    MergeOutcome {
        entry,
        status: MergeStatus::Extended,
    }
}

/// Build the working entry for one walked file
pub fn merge_file(
    baseline: &Manifest,
    logical_path: &str,
    digest: &DigestHex,
    length: u64,
    current_version: &str,
) -> MergeOutcome {
    match baseline.lookup(logical_path, digest) {
        Some(existing) => merge(existing, current_version),
        None => MergeOutcome {
            entry: ManifestEntry::fresh(
                digest.clone(),
                logical_path.to_string(),
                length,
                current_version,
            ),
            status: MergeStatus::New,
        },
    }
}

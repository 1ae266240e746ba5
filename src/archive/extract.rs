//! Zip extraction with path containment checks
//!
//! Every entry name is validated before anything is written, so an archive
//! with a single escaping entry leaves the filesystem untouched.

use crate::error::{StorageError, SyncError};
use crate::tree::path::resolve_within;
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::ZipArchive;

/// Extraction settings
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Root folder prefix to strip (e.g. a zipball's `Owner-repo-<sha>/`).
    /// Empty means entry names are used as is.
    pub root_prefix: String,

    /// Only entries whose first segment (after stripping) equals this are written.
    /// Empty means everything.
    pub include_top_level: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            root_prefix: String::new(),
            include_top_level: "assets".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files: usize,
    pub directories: usize,
    pub skipped: usize,
}

struct PlannedEntry {
    index: usize,
    target: PathBuf,
    is_dir: bool,
}

/// Strip the archive root folder if its name starts with `root_prefix`
fn strip_archive_root<'a>(name: &'a str, root_prefix: &str) -> &'a str {
    if root_prefix.is_empty() {
        return name;
    }
    match name.split_once('/') {
        Some((first, rest)) if first.starts_with(root_prefix) => rest,
        None if name.starts_with(root_prefix) => "",
        _ => name,
    }
}

fn top_level(relative: &str) -> &str {
    relative
        .trim_start_matches("./")
        .split('/')
        .next()
        .unwrap_or("")
}

/// Extract `archive` into `dest`, replacing any previous extraction there
pub fn extract_archive(
    archive: &Path,
    dest: &Path,
    options: &ExtractOptions,
) -> Result<ExtractSummary, SyncError> {
    let file = fs::File::open(archive).map_err(|e| {
        StorageError::IoError(std::io::Error::new(
            e.kind(),
            format!("Failed to open archive {:?}: {}", archive, e),
        ))
    })?;
    let mut zip = ZipArchive::new(BufReader::new(file))?;

    let mut plan = Vec::with_capacity(zip.len());
    let mut summary = ExtractSummary::default();
    for index in 0..zip.len() {
        let entry = zip.by_index_raw(index)?;
        let name = entry.name().to_string();
        let is_dir = entry.is_dir();
        drop(entry);

        let relative = strip_archive_root(&name, &options.root_prefix);
        let target = resolve_within(dest, relative)?;

        if relative.trim_matches('/').is_empty() {
            continue;
        }
        if !options.include_top_level.is_empty()
            && top_level(relative) != options.include_top_level
        {
            summary.skipped += 1;
            continue;
        }
        plan.push(PlannedEntry {
            index,
            target,
            is_dir,
        });
    }

    if dest.exists() {
        fs::remove_dir_all(dest)?;
    }
    fs::create_dir_all(dest)?;

    for planned in plan {
        if planned.is_dir {
            fs::create_dir_all(&planned.target)?;
            summary.directories += 1;
            continue;
        }
        if let Some(parent) = planned.target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut entry = zip.by_index(planned.index)?;
        let mut out = BufWriter::new(fs::File::create(&planned.target)?);
        std::io::copy(&mut entry, &mut out)?;
        debug!(path = %planned.target.display(), "Extracted");
        summary.files += 1;
    }

    info!(
        files = summary.files,
        directories = summary.directories,
        skipped = summary.skipped,
        root = %dest.display(),
        "Archive extracted"
    );
    Ok(summary)
}

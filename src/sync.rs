//! Sync Engine
//!
//! Runs the strictly ordered stages of one invocation:
//!
//! 1. load the baseline manifest from the remote store
//! 2. walk the asset tree, stage each selected file and merge its entry
//! 3. upload staged objects the remote store does not have yet
//! 4. publish the working manifest (always the last remote write)
//! 5. clean up local state
//!
//! Any failure aborts the run with a [`StageError`]. Staging is left in place on
//! failure. Once the walk completes the working manifest is written into the
//! staging area, and a re-run for the same version that finds it resumes at
//! stage 3 without downloading or walking again.

use crate::archive::{self, ExtractOptions};
use crate::config::UploaderConfig;
use crate::digest::{self, DigestHex};
use crate::error::{InStage, Stage, StageError, StorageError, SyncError};
use crate::manifest::{self, Manifest, MergeStatus};
use crate::store::{ObjectStaging, RemoteStore};
use crate::tree::{AssetSelector, SelectedFile, SelectionRules};
use bytes::Bytes;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Local paths used by one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkPaths {
    pub archive: PathBuf,
    pub extract_root: PathBuf,
    pub staging_root: PathBuf,
}

impl WorkPaths {
    pub fn new(work_dir: &Path, version: &str) -> Self {
        let base = format!("CEMCAU_{}", version);
        Self {
            archive: work_dir.join(format!("{}.zip", base)),
            extract_root: work_dir.join(&base),
            staging_root: work_dir.join(format!("{}_objects", base)),
        }
    }

    /// `<extract_root>/assets/<namespace>`
    pub fn asset_root(&self, namespace: &str) -> PathBuf {
        self.extract_root.join("assets").join(namespace)
    }
}

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub files_selected: usize,
    pub entries_new: usize,
    pub entries_extended: usize,
    pub entries_known: usize,
    pub entries_carried: usize,
    pub objects_staged: usize,
    pub objects_uploaded: usize,
    pub objects_skipped: usize,
    pub manifest_entries: usize,
    /// Continued from a staged working manifest instead of a fresh walk
    pub resumed: bool,
}

/// A distinct staged object awaiting the publish stage
#[derive(Debug, Clone)]
struct PendingObject {
    digest: DigestHex,
    /// False when the baseline already references this digest
    upload_candidate: bool,
}

/// Working state produced by the walk
struct WalkResult {
    working: Manifest,
    pending: Vec<PendingObject>,
}

pub struct SyncEngine {
    remote: RemoteStore,
    version: String,
    rules: SelectionRules,
}

impl SyncEngine {
    pub fn new(remote: RemoteStore, version: impl Into<String>, rules: SelectionRules) -> Self {
        Self {
            remote,
            version: version.into(),
            rules,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn remote(&self) -> &RemoteStore {
        &self.remote
    }

    /// Stages 1–4 over an already extracted tree
    pub async fn sync_tree(
        &self,
        extract_root: &Path,
        asset_root: &Path,
        staging: &ObjectStaging,
    ) -> Result<SyncReport, StageError> {
        let mut report = SyncReport::default();

        let baseline = self
            .remote
            .load_manifest()
            .await
            .in_stage(Stage::LoadBaseline)?;

        let selector = AssetSelector::new(
            extract_root.to_path_buf(),
            asset_root.to_path_buf(),
            self.rules.clone(),
        );
        let WalkResult {
            mut working,
            pending,
        } = self
            .walk_and_stage(&baseline, selector, staging, &mut report)
            .in_stage(Stage::WalkAndStage)?;

        report.entries_carried = working.carry_forward(&baseline);
        stage_manifest(&working, staging).in_stage(Stage::WalkAndStage)?;

        self.publish(&working, &pending, staging, &mut report).await?;
        Ok(report)
    }

    /// Stages 3–4 from a working manifest staged by an earlier, unpublished run
    pub async fn resume(
        &self,
        working: &Manifest,
        staging: &ObjectStaging,
    ) -> Result<SyncReport, StageError> {
        let mut report = SyncReport {
            resumed: true,
            ..SyncReport::default()
        };

        let baseline = self
            .remote
            .load_manifest()
            .await
            .in_stage(Stage::LoadBaseline)?;
        let pending = staged_objects(working, &baseline, staging);
        report.objects_staged = pending
            .iter()
            .filter(|object| staging.exists(&object.digest))
            .count();

        self.publish(working, &pending, staging, &mut report).await?;
        Ok(report)
    }

    async fn publish(
        &self,
        working: &Manifest,
        pending: &[PendingObject],
        staging: &ObjectStaging,
        report: &mut SyncReport,
    ) -> Result<(), StageError> {
        self.publish_objects(pending, staging, report)
            .await
            .in_stage(Stage::PublishObjects)?;

        report.manifest_entries = working.len();
        self.remote
            .put_manifest(working)
            .await
            .in_stage(Stage::PublishManifest)?;
        staging.discard_manifest().in_stage(Stage::PublishManifest)?;
        info!(
            key = %self.remote.manifest_key(),
            entries = working.len(),
            version = %self.version,
            "Published manifest"
        );
        Ok(())
    }

    fn walk_and_stage<I>(
        &self,
        baseline: &Manifest,
        files: I,
        staging: &ObjectStaging,
        report: &mut SyncReport,
    ) -> Result<WalkResult, SyncError>
    where
        I: Iterator<Item = Result<SelectedFile, StorageError>>,
    {
        let baseline_digests = baseline.digests();
        let mut working = Manifest::new();
        let mut pending = Vec::new();
        let mut seen: HashSet<DigestHex> = HashSet::new();

        for file in files {
            let file = file?;
            report.files_selected += 1;

            let staged = staging.stage_file(&file.path)?;
            let file_name = file.path.file_name().map(|n| n.to_string_lossy().into_owned());
            info!(
                "{} -> {}/{}",
                file_name.as_deref().unwrap_or(&file.logical_path),
                staged.digest.shard(),
                staged.digest
            );

            let outcome = manifest::merge_file(
                baseline,
                &file.logical_path,
                &staged.digest,
                staged.length,
                &self.version,
            );
            match outcome.status {
                MergeStatus::New => report.entries_new += 1,
                MergeStatus::Extended => report.entries_extended += 1,
                MergeStatus::AlreadyKnown => {
                    debug!(path = %file.logical_path, "Version already recorded");
                    report.entries_known += 1;
                }
            }
            working.push(outcome.entry);

            if seen.insert(staged.digest.clone()) {
                let upload_candidate = !baseline_digests.contains(staged.digest.as_str());
                pending.push(PendingObject {
                    digest: staged.digest,
                    upload_candidate,
                });
            }
        }

        report.objects_staged = pending.len();
        Ok(WalkResult { working, pending })
    }

    async fn publish_objects(
        &self,
        pending: &[PendingObject],
        staging: &ObjectStaging,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        for object in pending {
            let key = self.remote.object_key(&object.digest);
            if !object.upload_candidate {
                debug!(key = %key, "Skipping: referenced by baseline");
                report.objects_skipped += 1;
                continue;
            }
            if self.remote.has_object(&object.digest).await? {
                debug!(key = %key, "Skipping: already present remotely");
                report.objects_skipped += 1;
                continue;
            }

            info!("Uploading: {}", key);
            let data = staging.read(&object.digest)?;
            let actual = digest::digest(&data);
            if actual != object.digest {
                return Err(StorageError::HashMismatch {
                    path: staging.object_path(&object.digest).display().to_string(),
                    expected: object.digest.clone(),
                    actual,
                }
                .into());
            }
            let data = Bytes::from(data);
            self.remote.put_object(&object.digest, data).await?;
            report.objects_uploaded += 1;
        }
        Ok(())
    }
}

/// Write the working manifest into the staging area
fn stage_manifest(working: &Manifest, staging: &ObjectStaging) -> Result<(), SyncError> {
    staging.write_manifest(&working.serialize()?)?;
    debug!(path = %staging.manifest_path().display(), "Staged working manifest");
    Ok(())
}

/// Working manifest left by an earlier run of the same version, if any
fn load_staged_manifest(staging: &ObjectStaging) -> Result<Option<Manifest>, SyncError> {
    staging
        .read_manifest()?
        .map(|bytes| Manifest::from_slice(&bytes))
        .transpose()
}

/// Upload work for a staged manifest: every distinct digest that is staged
/// locally or not referenced by the baseline, in first-seen order
fn staged_objects(
    working: &Manifest,
    baseline: &Manifest,
    staging: &ObjectStaging,
) -> Vec<PendingObject> {
    let baseline_digests = baseline.digests();
    let mut seen: HashSet<&DigestHex> = HashSet::new();
    let mut pending = Vec::new();
    for entry in working.entries() {
        if !seen.insert(&entry.digest) {
            continue;
        }
        let known = baseline_digests.contains(entry.digest.as_str());
        if known && !staging.exists(&entry.digest) {
            // carried forward from the baseline, nothing staged for it
            continue;
        }
        pending.push(PendingObject {
            digest: entry.digest.clone(),
            upload_candidate: !known,
        });
    }
    pending
}

/// Full pipeline: download, extract, sync, clean up
pub async fn run(
    config: &UploaderConfig,
    version: &str,
    keep_staging: bool,
) -> Result<SyncReport, StageError> {
    let remote = RemoteStore::from_config(&config.store).in_stage(Stage::Configure)?;
    run_with_remote(config, version, keep_staging, remote).await
}

/// Full pipeline against an already built remote store
///
/// When the staging area holds a working manifest from an earlier run of
/// `version`, download, extraction and the walk are skipped.
pub async fn run_with_remote(
    config: &UploaderConfig,
    version: &str,
    keep_staging: bool,
    remote: RemoteStore,
) -> Result<SyncReport, StageError> {
    let work_dir = prepare_work_dir(&config.work_dir).in_stage(Stage::Configure)?;
    let paths = WorkPaths::new(&work_dir, version);
    let staging = ObjectStaging::new(&paths.staging_root).in_stage(Stage::Configure)?;
    let engine = SyncEngine::new(remote, version, config.selection.clone());

    let report = match load_staged_manifest(&staging).in_stage(Stage::LoadBaseline)? {
        Some(working) => {
            info!(
                path = %staging.manifest_path().display(),
                entries = working.len(),
                "Resuming from staged manifest"
            );
            engine.resume(&working, &staging).await?
        }
        None => {
            let url = config.source.download_url(version);
            archive::download_archive(&url, &paths.archive)
                .await
                .in_stage(Stage::Download)?;

            let options = ExtractOptions {
                root_prefix: config.source.archive_root_prefix.clone(),
                ..ExtractOptions::default()
            };
            archive::extract_archive(&paths.archive, &paths.extract_root, &options)
                .in_stage(Stage::Extract)?;
            fs::remove_file(&paths.archive).in_stage(Stage::Extract)?;

            engine
                .sync_tree(
                    &paths.extract_root,
                    &paths.asset_root(&config.source.namespace),
                    &staging,
                )
                .await?
        }
    };

    cleanup(&paths, staging, keep_staging).in_stage(Stage::Cleanup)?;
    Ok(report)
}

/// Create the work directory and resolve it to an absolute path
fn prepare_work_dir(work_dir: &Path) -> Result<PathBuf, SyncError> {
    fs::create_dir_all(work_dir)?;
    let canonical = dunce::canonicalize(work_dir)?;
    debug!(path = %canonical.display(), "Work directory ready");
    Ok(canonical)
}

fn cleanup(paths: &WorkPaths, staging: ObjectStaging, keep_staging: bool) -> Result<(), SyncError> {
    match fs::remove_dir_all(&paths.extract_root) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    if keep_staging {
        info!(path = %staging.root().display(), "Keeping staging area");
        return Ok(());
    }
    staging.remove()?;
    Ok(())
}

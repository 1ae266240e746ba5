//! Integration tests for resuming a run that failed after staging

use super::test_utils::{published_manifest, FaultyStore, Faults, PREFIX};
use asset_uploader::config::{SourceConfig, StoreConfig, UploaderConfig};
use asset_uploader::digest::digest;
use asset_uploader::error::Stage;
use asset_uploader::logging::LoggingConfig;
use asset_uploader::store::{ObjectStaging, RemoteStore};
use asset_uploader::sync::{run_with_remote, SyncEngine, WorkPaths};
use asset_uploader::tree::SelectionRules;
use object_store::memory::InMemory;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Config whose archive URL cannot be fetched, so any download attempt fails the run
fn offline_config(work_dir: &Path) -> UploaderConfig {
    UploaderConfig {
        work_dir: work_dir.to_path_buf(),
        keep_staging: false,
        source: SourceConfig {
            url_template: "http://127.0.0.1:9/{version}.zip".to_string(),
            ..SourceConfig::default()
        },
        store: StoreConfig::default(),
        selection: SelectionRules::default(),
        logging: LoggingConfig::default(),
    }
}

fn write_asset(paths: &WorkPaths, relative: &str, content: &[u8]) {
    let full = paths.asset_root("minecraft").join(relative);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, content).unwrap();
}

#[tokio::test]
async fn test_rerun_resumes_from_staging_without_download() {
    let temp_dir = TempDir::new().unwrap();
    let work_dir = dunce::canonicalize(temp_dir.path()).unwrap();
    let paths = WorkPaths::new(&work_dir, "1.21.4");
    write_asset(&paths, "textures/foo.png", b"ABC");
    write_asset(&paths, "textures/bar.png", b"XYZ");

    // First attempt: extracted and staged, then every object upload fails.
    let inner = Arc::new(InMemory::new());
    let failing = FaultyStore::remote(
        inner.clone(),
        Faults {
            object_puts: true,
            ..Faults::default()
        },
    );
    let staging = ObjectStaging::new(&paths.staging_root).unwrap();
    let err = SyncEngine::new(failing, "1.21.4", SelectionRules::default())
        .sync_tree(&paths.extract_root, &paths.asset_root("minecraft"), &staging)
        .await
        .unwrap_err();
    assert_eq!(err.stage, Stage::PublishObjects);
    assert!(staging.read_manifest().unwrap().is_some());

    // Nothing to download, extract or walk on the second attempt.
    fs::remove_dir_all(&paths.extract_root).unwrap();
    assert!(!paths.archive.exists());

    let remote = RemoteStore::with_store(inner, PREFIX);
    let report = run_with_remote(&offline_config(&work_dir), "1.21.4", false, remote.clone())
        .await
        .unwrap();

    assert!(report.resumed);
    assert_eq!(report.files_selected, 0);
    assert_eq!(report.objects_uploaded, 2);
    assert_eq!(report.manifest_entries, 2);
    assert!(remote.has_object(&digest(b"ABC")).await.unwrap());
    assert!(remote.has_object(&digest(b"XYZ")).await.unwrap());
    assert!(!paths.archive.exists());
    assert!(!paths.extract_root.exists());
    assert!(!paths.staging_root.exists());

    let manifest = published_manifest(&remote).await;
    let entries = manifest.as_array().unwrap();
    let published: Vec<_> = entries.iter().map(|e| e["path"].as_str().unwrap()).collect();
    assert_eq!(
        published,
        vec![
            "/assets/minecraft/textures/bar.png",
            "/assets/minecraft/textures/foo.png"
        ]
    );
    assert_eq!(entries[1]["hash"], "902fbdd2b1df0c4f70b4a5d23525e932");
    assert_eq!(entries[1]["versions"], serde_json::json!(["1.21.4"]));
}

#[tokio::test]
async fn test_partial_upload_resumes_with_remaining_objects() {
    let temp_dir = TempDir::new().unwrap();
    let work_dir = dunce::canonicalize(temp_dir.path()).unwrap();
    let paths = WorkPaths::new(&work_dir, "v2");
    write_asset(&paths, "textures/a.png", b"A");
    write_asset(&paths, "textures/b.png", b"B");

    let inner = Arc::new(InMemory::new());
    let failing = FaultyStore::remote(
        inner.clone(),
        Faults {
            object_puts: true,
            ..Faults::default()
        },
    );
    let staging = ObjectStaging::new(&paths.staging_root).unwrap();
    SyncEngine::new(failing, "v2", SelectionRules::default())
        .sync_tree(&paths.extract_root, &paths.asset_root("minecraft"), &staging)
        .await
        .unwrap_err();

    // One object made it before the failure.
    let remote = RemoteStore::with_store(inner, PREFIX);
    remote
        .put_object(&digest(b"A"), bytes::Bytes::from_static(b"A"))
        .await
        .unwrap();

    let report = run_with_remote(&offline_config(&work_dir), "v2", true, remote.clone())
        .await
        .unwrap();
    assert!(report.resumed);
    assert_eq!(report.objects_uploaded, 1);
    assert_eq!(report.objects_skipped, 1);
    assert!(remote.has_object(&digest(b"B")).await.unwrap());

    // Kept staging no longer marks an unpublished run.
    let staging = ObjectStaging::new(&paths.staging_root).unwrap();
    assert!(staging.read_manifest().unwrap().is_none());
}

#[tokio::test]
async fn test_without_staged_manifest_run_downloads() {
    let temp_dir = TempDir::new().unwrap();
    let remote = RemoteStore::memory(PREFIX);

    let err = run_with_remote(&offline_config(temp_dir.path()), "v1", false, remote.clone())
        .await
        .unwrap_err();
    assert_eq!(err.stage, Stage::Download);
    assert!(remote.get_bytes(&remote.manifest_key()).await.unwrap().is_none());
}

//! Integration tests for version-aware manifest merging across runs

use super::test_utils::{published_manifest, Fixture, PREFIX};
use asset_uploader::digest::digest;
use asset_uploader::manifest::{Manifest, ManifestEntry};
use asset_uploader::store::RemoteStore;
use serde_json::json;

fn versions_of(manifest: &serde_json::Value, path: &str) -> Vec<Vec<String>> {
    manifest
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["path"] == path)
        .map(|e| serde_json::from_value(e["versions"].clone()).unwrap())
        .collect()
}

/// A baseline entry {D, P, [v1]} merged by a v2 run becomes {D, P, [v1, v2]}
#[tokio::test]
async fn test_new_version_extends_existing_entry() {
    let fixture = Fixture::new(&[("assets/minecraft/textures/a.png", b"A")]);
    let remote = RemoteStore::memory(PREFIX);

    fixture.sync(&remote, "v1").await;
    let report = fixture.sync(&remote, "v2").await;
    assert_eq!(report.entries_extended, 1);
    assert_eq!(report.entries_new, 0);

    let manifest = published_manifest(&remote).await;
    assert_eq!(
        manifest,
        json!([{
            "hash": digest(b"A").as_str(),
            "path": "/assets/minecraft/textures/a.png",
            "length": 1,
            "versions": ["v1", "v2"]
        }])
    );
}

/// Re-running a version already recorded leaves the manifest unchanged
#[tokio::test]
async fn test_repeated_version_is_not_duplicated() {
    let fixture = Fixture::new(&[
        ("assets/minecraft/textures/a.png", b"A"),
        ("assets/minecraft/textures/b.png", b"B"),
    ]);
    let remote = RemoteStore::memory(PREFIX);

    fixture.sync(&remote, "v1").await;
    let first = published_manifest(&remote).await;

    let report = fixture.sync(&remote, "v1").await;
    assert_eq!(report.entries_known, 2);
    assert_eq!(report.objects_uploaded, 0);
    assert_eq!(report.objects_skipped, 2);
    assert_eq!(published_manifest(&remote).await, first);
}

/// A content change at the same path yields a second entry; the old one persists
#[tokio::test]
async fn test_changed_content_keeps_history() {
    let fixture = Fixture::new(&[("assets/minecraft/textures/a.png", b"old")]);
    let remote = RemoteStore::memory(PREFIX);
    fixture.sync(&remote, "v1").await;

    fixture.write("assets/minecraft/textures/a.png", b"new");
    let report = fixture.sync(&remote, "v2").await;
    assert_eq!(report.entries_new, 1);
    assert_eq!(report.entries_carried, 1);

    let manifest = published_manifest(&remote).await;
    assert_eq!(
        versions_of(&manifest, "/assets/minecraft/textures/a.png"),
        vec![vec!["v2".to_string()], vec!["v1".to_string()]]
    );
}

/// Files absent from the current version keep their entries
#[tokio::test]
async fn test_removed_file_is_carried_forward() {
    let fixture = Fixture::new(&[
        ("assets/minecraft/textures/a.png", b"A"),
        ("assets/minecraft/textures/gone.png", b"G"),
    ]);
    let remote = RemoteStore::memory(PREFIX);
    fixture.sync(&remote, "v1").await;

    std::fs::remove_file(fixture.asset_root().join("textures").join("gone.png")).unwrap();
    let report = fixture.sync(&remote, "v2").await;
    assert_eq!(report.entries_carried, 1);

    let manifest = published_manifest(&remote).await;
    assert_eq!(
        versions_of(&manifest, "/assets/minecraft/textures/gone.png"),
        vec![vec!["v1".to_string()]]
    );
    assert_eq!(
        versions_of(&manifest, "/assets/minecraft/textures/a.png"),
        vec![vec!["v1".to_string(), "v2".to_string()]]
    );
}

/// A manifest written by an older publisher is read verbatim, including empty version lists
#[tokio::test]
async fn test_legacy_manifest_entries_preserved() {
    let remote = RemoteStore::memory(PREFIX);
    let legacy = Manifest::from_entries(vec![ManifestEntry {
        digest: digest(b"legacy"),
        logical_path: "/assets/minecraft/textures/old.png".to_string(),
        length: 6,
        versions: vec![],
    }]);
    remote.put_manifest(&legacy).await.unwrap();

    let fixture = Fixture::new(&[("assets/minecraft/textures/a.png", b"A")]);
    fixture.sync(&remote, "v1").await;

    let manifest = published_manifest(&remote).await;
    assert_eq!(manifest.as_array().unwrap().len(), 2);
    assert_eq!(manifest[1]["versions"], json!([]));
    assert_eq!(manifest[1]["path"], "/assets/minecraft/textures/old.png");
}

//! Shared fixtures: extracted asset trees, zip archives and engines

use asset_uploader::store::{ObjectStaging, RemoteStore, MANIFEST_NAME};
use asset_uploader::sync::{SyncEngine, SyncReport};
use asset_uploader::tree::SelectionRules;
use async_trait::async_trait;
use futures::stream::BoxStream;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{
    GetOptions, GetResult, ListResult, MultipartUpload, ObjectMeta, ObjectStore,
    PutMultipartOpts, PutOptions, PutPayload, PutResult,
};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const PREFIX: &str = "assets-cas";

/// An extracted tree under a temp dir
pub struct Fixture {
    pub temp_dir: TempDir,
    pub extract_root: PathBuf,
}

impl Fixture {
    pub fn new(files: &[(&str, &[u8])]) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let extract_root = temp_dir.path().join("extract");
        fs::create_dir_all(extract_root.join("assets").join("minecraft")).unwrap();
        let fixture = Self {
            temp_dir,
            extract_root,
        };
        for (path, content) in files {
            fixture.write(path, content);
        }
        fixture
    }

    pub fn write(&self, relative: &str, content: &[u8]) {
        let full = self.extract_root.join(relative);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    pub fn asset_root(&self) -> PathBuf {
        self.extract_root.join("assets").join("minecraft")
    }

    pub fn staging(&self) -> ObjectStaging {
        ObjectStaging::new(self.temp_dir.path().join("objects")).unwrap()
    }

    /// Run stages 1–4 against `remote` for `version`
    pub async fn sync(&self, remote: &RemoteStore, version: &str) -> SyncReport {
        let engine = SyncEngine::new(remote.clone(), version, SelectionRules::default());
        engine
            .sync_tree(&self.extract_root, &self.asset_root(), &self.staging())
            .await
            .unwrap()
    }
}

/// Write a zip archive with the given entries (names ending in `/` are directories)
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let mut writer = ZipWriter::new(fs::File::create(path).unwrap());
    for (name, content) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(*name, SimpleFileOptions::default())
                .unwrap();
        } else {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content).unwrap();
        }
    }
    writer.finish().unwrap();
}

/// Published manifest as JSON value
pub async fn published_manifest(remote: &RemoteStore) -> serde_json::Value {
    let bytes = remote
        .get_bytes(&remote.manifest_key())
        .await
        .unwrap()
        .expect("manifest should be published");
    serde_json::from_slice(&bytes).unwrap()
}

/// Which remote operations a [`FaultyStore`] rejects
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    /// Every `put` except the manifest
    pub object_puts: bool,
    /// `get` of the manifest (existence probes are unaffected)
    pub manifest_reads: bool,
}

/// In-memory store that fails the operations selected by [`Faults`]
#[derive(Debug)]
pub struct FaultyStore {
    inner: Arc<InMemory>,
    faults: Faults,
}

impl FaultyStore {
    /// Wrap `inner` as a remote store under [`PREFIX`]
    pub fn remote(inner: Arc<InMemory>, faults: Faults) -> RemoteStore {
        RemoteStore::with_store(Arc::new(Self { inner, faults }), PREFIX)
    }

    fn rejected(operation: &str, location: &ObjectPath) -> object_store::Error {
        object_store::Error::Generic {
            store: "FaultyStore",
            source: format!("{} rejected for {}", operation, location).into(),
        }
    }
}

fn is_manifest(location: &ObjectPath) -> bool {
    location.filename() == Some(MANIFEST_NAME)
}

impl fmt::Display for FaultyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FaultyStore({})", self.inner)
    }
}

#[async_trait]
impl ObjectStore for FaultyStore {
    async fn put_opts(
        &self,
        location: &ObjectPath,
        payload: PutPayload,
        opts: PutOptions,
    ) -> object_store::Result<PutResult> {
        if self.faults.object_puts && !is_manifest(location) {
            return Err(Self::rejected("put", location));
        }
        self.inner.put_opts(location, payload, opts).await
    }

    async fn put_multipart_opts(
        &self,
        location: &ObjectPath,
        opts: PutMultipartOpts,
    ) -> object_store::Result<Box<dyn MultipartUpload>> {
        self.inner.put_multipart_opts(location, opts).await
    }

    async fn get_opts(
        &self,
        location: &ObjectPath,
        options: GetOptions,
    ) -> object_store::Result<GetResult> {
        if self.faults.manifest_reads && !options.head && is_manifest(location) {
            return Err(Self::rejected("get", location));
        }
        self.inner.get_opts(location, options).await
    }

    async fn delete(&self, location: &ObjectPath) -> object_store::Result<()> {
        self.inner.delete(location).await
    }

    fn list(&self, prefix: Option<&ObjectPath>) -> BoxStream<'_, object_store::Result<ObjectMeta>> {
        self.inner.list(prefix)
    }

    async fn list_with_delimiter(
        &self,
        prefix: Option<&ObjectPath>,
    ) -> object_store::Result<ListResult> {
        self.inner.list_with_delimiter(prefix).await
    }

    async fn copy(&self, from: &ObjectPath, to: &ObjectPath) -> object_store::Result<()> {
        self.inner.copy(from, to).await
    }

    async fn copy_if_not_exists(
        &self,
        from: &ObjectPath,
        to: &ObjectPath,
    ) -> object_store::Result<()> {
        self.inner.copy_if_not_exists(from, to).await
    }
}

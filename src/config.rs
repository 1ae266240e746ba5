//! Configuration System
//!
//! Layered configuration: merge-policy defaults, then an optional TOML file,
//! then the `S3_*` environment (including a `.env` file in the working
//! directory). Validated once at startup.

use crate::error::SyncError;
use crate::logging::LoggingConfig;
use crate::tree::SelectionRules;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

mod merge;
mod sources;

pub use merge::merge_policy::{
    DEFAULT_ARCHIVE_ROOT_PREFIX, DEFAULT_NAMESPACE, DEFAULT_REGION, DEFAULT_URL_TEMPLATE,
};
pub use sources::env_vars::ENV_BINDINGS;
pub use sources::file::DEFAULT_CONFIG_FILE;

/// Placeholder replaced by the version tag in the download URL
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploaderConfig {
    /// Directory holding the downloaded archive, extraction tree and staging area
    pub work_dir: PathBuf,

    /// Keep the staging area after a successful run
    #[serde(default)]
    pub keep_staging: bool,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub selection: SelectionRules,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the asset archive comes from and how it is laid out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Archive URL with a `{version}` placeholder
    pub url_template: String,

    /// Prefix of the archive's root folder name, stripped on extraction
    pub archive_root_prefix: String,

    /// Asset namespace; files under `assets/<namespace>` are selected
    pub namespace: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            archive_root_prefix: DEFAULT_ARCHIVE_ROOT_PREFIX.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl SourceConfig {
    pub fn download_url(&self, version: &str) -> String {
        self.url_template.replace(VERSION_PLACEHOLDER, version)
    }
}

/// Object store connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub prefix: String,
    /// Path-style (`endpoint/bucket/key`) instead of virtual-hosted-style addressing
    #[serde(default)]
    pub path_style: bool,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: default_region(),
            access_key: String::new(),
            secret_key: String::new(),
            bucket: String::new(),
            prefix: String::new(),
            path_style: false,
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key", &redact(&self.access_key))
            .field("secret_key", &redact(&self.secret_key))
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("path_style", &self.path_style)
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl UploaderConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), SyncError> {
        let mut errors = Vec::new();

        if self.store.bucket.trim().is_empty() {
            errors.push("store.bucket (S3_BUCKET) must be set".to_string());
        }
        if !self.source.url_template.contains(VERSION_PLACEHOLDER) {
            errors.push(format!(
                "source.url_template must contain {}",
                VERSION_PLACEHOLDER
            ));
        }
        let ns = &self.source.namespace;
        if ns.is_empty() || ns.contains(['/', '\\']) || ns == "." || ns == ".." {
            errors.push(format!(
                "source.namespace must be a single path segment, got {:?}",
                ns
            ));
        }
        if self.work_dir.as_os_str().is_empty() {
            errors.push("work_dir cannot be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SyncError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                errors.join("\n")
            )))
        }
    }
}

/// Reject version tags that cannot be used in file names and URLs
pub fn validate_version_tag(version: &str) -> Result<(), SyncError> {
    let valid = !version.is_empty()
        && version != "."
        && version != ".."
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '+'));
    if valid {
        Ok(())
    } else {
        Err(SyncError::ConfigError(format!(
            "Invalid version tag: {:?}",
            version
        )))
    }
}

/// Loads [`UploaderConfig`] from its sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load `.env` from the working directory into the process environment.
    /// Call before [`ConfigLoader::load`]; returns the file that was loaded.
    pub fn load_dotenv() -> Result<Option<PathBuf>, SyncError> {
        Ok(sources::env_vars::load_dotenv()?)
    }

    /// Load from the process environment and an optional config file
    pub fn load(config_file: Option<&Path>) -> Result<UploaderConfig, SyncError> {
        Self::load_with_env(config_file, |name| std::env::var(name).ok())
    }

    /// Load with an explicit environment lookup (no `.env` handling)
    pub fn load_with_env<F>(
        config_file: Option<&Path>,
        lookup: F,
    ) -> Result<UploaderConfig, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let builder = merge::merge_policy::builder_with_defaults(&std::env::temp_dir())?;
        let builder = sources::file::add_to_builder(builder, config_file)?;
        let builder = sources::env_vars::add_to_builder(builder, lookup)?;
        let config: UploaderConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Load a config file only (no environment)
    pub fn load_from_file(path: &Path) -> Result<UploaderConfig, SyncError> {
        Self::load_with_env(Some(path), |_| None)
    }
}

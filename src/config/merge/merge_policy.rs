//! Merge rules: defaults first, then file, then environment.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;
use std::path::Path;

pub const DEFAULT_URL_TEMPLATE: &str =
    "https://github.com/InventivetalentDev/minecraft-assets/zipball/refs/heads/{version}";
pub const DEFAULT_ARCHIVE_ROOT_PREFIX: &str = "InventivetalentDev-minecraft-assets";
pub const DEFAULT_NAMESPACE: &str = "minecraft";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults(
    work_dir: &Path,
) -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    Config::builder()
        .set_default("work_dir", work_dir.to_string_lossy().to_string())?
        .set_default("keep_staging", false)?
        .set_default("source.url_template", DEFAULT_URL_TEMPLATE)?
        .set_default("source.archive_root_prefix", DEFAULT_ARCHIVE_ROOT_PREFIX)?
        .set_default("source.namespace", DEFAULT_NAMESPACE)?
        .set_default("store.region", DEFAULT_REGION)?
        .set_default("store.prefix", "")?
        .set_default("store.path_style", false)
}

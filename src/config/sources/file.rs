//! Config file source: `--config <path>` or `./asset-uploader.toml`

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "asset-uploader.toml";

pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Add a config file source. An explicitly named file must exist.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    explicit: Option<&Path>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = match explicit {
        Some(path) => builder.add_source(File::from(path).required(true)),
        None => {
            let path = default_config_path();
            if path.exists() {
                builder.add_source(File::from(path).required(false))
            } else {
                builder
            }
        }
    };
    Ok(builder)
}

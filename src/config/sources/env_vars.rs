//! Environment source for the object store settings (`S3_*`)

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use std::path::{Path, PathBuf};

/// Environment variable to config key
pub const ENV_BINDINGS: &[(&str, &str)] = &[
    ("S3_ENDPOINT", "store.endpoint"),
    ("S3_REGION", "store.region"),
    ("S3_ACCESS_KEY", "store.access_key"),
    ("S3_SECRET_KEY", "store.secret_key"),
    ("S3_BUCKET", "store.bucket"),
    ("S3_PREFIX", "store.prefix"),
    ("S3_PATH_STYLE", "store.path_style"),
];

/// Load `.env` from the working directory into the process environment.
/// Returns the file that was loaded. A missing file is fine; a malformed one is not.
pub fn load_dotenv() -> Result<Option<PathBuf>, ConfigError> {
    loaded(dotenvy::dotenv())
}

/// Load a specific env file into the process environment
pub fn load_env_file(path: &Path) -> Result<Option<PathBuf>, ConfigError> {
    loaded(dotenvy::from_path(path).map(|()| path.to_path_buf()))
}

fn loaded(result: Result<PathBuf, dotenvy::Error>) -> Result<Option<PathBuf>, ConfigError> {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(ConfigError::Message(format!("Failed to load .env: {}", e))),
    }
}

/// Override config keys from environment variables that are set and non-empty
pub fn add_to_builder<F>(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: F,
) -> Result<ConfigBuilder<DefaultState>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    for (var, key) in ENV_BINDINGS {
        let value = lookup(var).filter(|v| !v.trim().is_empty());
        builder = builder.set_override_option(*key, value)?;
    }
    Ok(builder)
}

//! CLI route: resolve configuration and run the pipeline.

use crate::cli::parse::Cli;
use crate::config::{self, ConfigLoader, UploaderConfig};
use crate::error::{InStage, Stage, StageError};
use crate::logging::LoggingConfig;
use crate::sync::{self, SyncReport};
use std::path::{Path, PathBuf};
use tracing::info;

/// Resolved configuration for one invocation
pub struct RunContext {
    config: UploaderConfig,
    version: String,
    keep_staging: bool,
    env_file: Option<PathBuf>,
}

impl RunContext {
    /// Load and validate configuration for `cli`
    pub fn new(cli: &Cli) -> Result<Self, StageError> {
        config::validate_version_tag(&cli.version_tag).in_stage(Stage::Configure)?;
        let env_file = ConfigLoader::load_dotenv().in_stage(Stage::Configure)?;
        let config = ConfigLoader::load(cli.config.as_deref()).in_stage(Stage::Configure)?;
        Ok(Self {
            env_file,
            ..Self::from_config(cli, config)
        })
    }

    /// Build from an already loaded configuration
    pub fn from_config(cli: &Cli, config: UploaderConfig) -> Self {
        let keep_staging = cli.keep_staging || config.keep_staging;
        Self {
            config,
            version: cli.version_tag.clone(),
            keep_staging,
            env_file: None,
        }
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// `.env` file loaded into the environment, if one was found
    pub fn env_file(&self) -> Option<&Path> {
        self.env_file.as_deref()
    }

    /// Logging settings: CLI flags override the config file
    pub fn logging_config(&self, cli: &Cli) -> LoggingConfig {
        let mut logging = self.config.logging.clone();
        if cli.verbose {
            logging.level = "debug".to_string();
        }
        if let Some(ref level) = cli.log_level {
            logging.level = level.clone();
        }
        if let Some(ref format) = cli.log_format {
            logging.format = format.clone();
        }
        if let Some(ref output) = cli.log_output {
            logging.output = output.clone();
        }
        logging
    }

    /// Validate and run the whole pipeline
    pub fn execute(&self) -> Result<SyncReport, StageError> {
        self.config.validate().in_stage(Stage::Configure)?;
        info!(
            version = %self.version,
            bucket = %self.config.store.bucket,
            prefix = %self.config.store.prefix,
            "Starting sync"
        );

        let rt = tokio::runtime::Runtime::new().in_stage(Stage::Configure)?;
        rt.block_on(sync::run(&self.config, &self.version, self.keep_staging))
    }
}

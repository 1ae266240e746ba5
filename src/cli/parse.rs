//! CLI parse: clap types. No behavior; definitions only.

use clap::Parser;
use std::path::PathBuf;

/// Version tag used when none is given
pub const DEFAULT_VERSION_TAG: &str = "1.21.4";

/// Mirror a versioned asset archive into a content-addressed object store
#[derive(Parser, Debug)]
#[command(name = "asset-uploader")]
#[command(about = "Mirror versioned game asset archives into a content-addressed object store")]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Product version tag to download and record in the manifest
    #[arg(long = "version", default_value = DEFAULT_VERSION_TAG)]
    pub version_tag: String,

    /// Configuration file path (default: ./asset-uploader.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Keep the local staging area after a successful run
    #[arg(long)]
    pub keep_staging: bool,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr)
    #[arg(long)]
    pub log_output: Option<String>,
}

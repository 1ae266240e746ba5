//! Asset Uploader CLI Binary
//!
//! Downloads a versioned asset archive and mirrors it into the configured
//! content-addressed object store.

use asset_uploader::cli::{format_report, map_error, Cli, RunContext};
use asset_uploader::logging::init_logging;
use clap::Parser;
use std::process;
use tracing::{debug, error, info};

fn main() {
    let cli = Cli::parse();

    // Logging settings live in the config file, so configuration loads first.
    let context = match RunContext::new(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(&context.logging_config(&cli)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Asset Uploader Version: {}", env!("CARGO_PKG_VERSION"));
    match context.env_file() {
        Some(path) => debug!(path = %path.display(), "Loaded .env"),
        None => debug!("No .env file found, using process environment only"),
    }

    match context.execute() {
        Ok(report) => {
            info!(?report, "Sync completed successfully");
            println!("{}", format_report(context.version(), &report));
        }
        Err(e) => {
            error!(stage = %e.stage, "Sync failed: {}", e.source);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    }
}

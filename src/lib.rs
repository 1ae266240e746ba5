//! Asset Uploader: content-addressed mirroring of versioned asset archives
//!
//! Downloads a versioned asset archive, selects the cacheable files, stores
//! each one under its content digest and publishes a version-aware manifest
//! (`index.json`) next to the objects in an S3-compatible store.

pub mod archive;
pub mod cli;
pub mod config;
pub mod digest;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod store;
pub mod sync;
pub mod tree;

//! Source archive handling: download and extraction

pub mod download;
pub mod extract;

pub use download::download_archive;
pub use extract::{extract_archive, ExtractOptions, ExtractSummary};

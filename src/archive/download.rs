//! HTTP download of the versioned asset archive

use crate::error::SyncError;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Download `url` into `dest`, returning the number of bytes written
pub async fn download_archive(url: &str, dest: &Path) -> Result<u64, SyncError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    info!(url = %url, "Downloading archive");
    let client = reqwest::Client::builder()
        .user_agent(concat!("asset-uploader/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let mut response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SyncError::DownloadStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let mut out = BufWriter::new(fs::File::create(dest)?);
    let mut written: u64 = 0;
    while let Some(chunk) = response.chunk().await? {
        out.write_all(&chunk)?;
        written += chunk.len() as u64;
    }
    out.flush()?;

    info!(path = %dest.display(), bytes = written, "Archive downloaded");
    Ok(written)
}

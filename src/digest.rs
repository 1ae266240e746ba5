//! Content digests and digest-derived storage paths
//!
//! Objects are addressed by the lowercase hex MD5 of their bytes. The digest is
//! used for deduplication only, so a 128-bit hash is enough and keeps addresses
//! compatible with manifests published by earlier runs.

use crate::error::StorageError;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;

/// Length of a hex-encoded digest
pub const DIGEST_HEX_LEN: usize = 32;

/// Length of the shard directory name
const SHARD_LEN: usize = 2;

/// Lowercase hex-encoded 128-bit content digest
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DigestHex(String);

impl DigestHex {
    /// Parse and validate a hex digest string
    pub fn parse(value: &str) -> Result<Self, StorageError> {
        let valid = value.len() == DIGEST_HEX_LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !valid {
            return Err(StorageError::InvalidDigest(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shard directory: the first two hex characters
    pub fn shard(&self) -> &str {
        &self.0[..SHARD_LEN.min(self.0.len())]
    }
}

impl fmt::Display for DigestHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DigestHex {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Compute the digest of in-memory content
pub fn digest(content: &[u8]) -> DigestHex {
    let mut hasher = Md5::new();
    hasher.update(content);
    DigestHex(hex::encode(hasher.finalize()))
}

/// Compute the digest of a byte stream without buffering it whole
pub fn digest_reader<R: Read>(mut reader: R) -> Result<DigestHex, StorageError> {
    let mut hasher = Md5::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let read = reader.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(DigestHex(hex::encode(hasher.finalize())))
}

/// Two-level storage location: `(prefix_dir, file_name)`
///
/// At most 256 shard directories exist since the prefix is two hex characters.
pub fn storage_path(digest: &DigestHex) -> (&str, &str) {
    (digest.shard(), digest.as_str())
}

//! File checksums.

use std::fmt::LowerHex;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use sha1::Sha1;
use sha2::digest::Output;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Files are hashed in 1 MiB reads.
const CHUNK_SIZE: usize = 1 << 20;

/// Lowercase hex SHA-1 of a file's contents.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn file_sha1(path: impl AsRef<Path>) -> Result<String> {
    hash_file::<Sha1>(path.as_ref())
}

/// Lowercase hex SHA-256 of a file's contents.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn file_sha256(path: impl AsRef<Path>) -> Result<String> {
    hash_file::<Sha256>(path.as_ref())
}

fn hash_file<D: Digest>(path: &Path) -> Result<String>
where
    Output<D>: LowerHex,
{
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = D::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Compares hex digests on their common prefix, ignoring case.
///
/// Published hashes are sometimes abbreviated, so only the first
/// `min(actual.len(), expected.len())` digits are compared.
#[must_use]
pub fn hashes_match(actual: &str, expected: &str) -> bool {
    let len = actual.len().min(expected.len());
    match (actual.get(..len), expected.get(..len)) {
        (Some(a), Some(e)) => a.eq_ignore_ascii_case(e),
        _ => false,
    }
}

/// Checks whether the SHA-1 of `path` matches `expected`.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn check_sha1(path: impl AsRef<Path>, expected: &str) -> Result<bool> {
    let path = path.as_ref();
    let actual = file_sha1(path)?;
    let matches = hashes_match(&actual, expected.trim());
    debug!(
        "sha1 {} for {}: {actual} (expected {expected})",
        if matches { "ok" } else { "mismatch" },
        path.display()
    );
    Ok(matches)
}

//! Verify command - compare a file's hash with an expected value.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use cnstd_adapters::checksum::{file_sha1, file_sha256, hashes_match};

use super::ExitCode;

/// Hex digits in a SHA-1 digest; longer expected hashes are SHA-256.
const SHA1_HEX_LEN: usize = 40;

/// Arguments for the verify command
#[derive(Args)]
pub struct VerifyArgs {
    /// File to check
    pub file: PathBuf,

    /// Expected SHA-1 (a prefix is enough) or full SHA-256, in hex
    pub hash: String,
}

/// Run the verify command.
///
/// Returns [`ExitCode::Mismatch`] when the hash differs.
pub fn run(args: &VerifyArgs) -> Result<ExitCode> {
    let expected = args.hash.trim();
    let actual = if expected.len() > SHA1_HEX_LEN {
        file_sha256(&args.file)?
    } else {
        file_sha1(&args.file)?
    };

    if hashes_match(&actual, expected) {
        println!("{}: OK", args.file.display());
        Ok(ExitCode::Success)
    } else {
        println!(
            "{}: FAILED (expected {expected}, got {actual})",
            args.file.display()
        );
        Ok(ExitCode::Mismatch)
    }
}

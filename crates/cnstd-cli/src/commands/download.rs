//! Download command - fetch a single file.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use cnstd_adapters::{download, DownloadRequest};

use crate::output::DownloadProgress;

/// Arguments for the download command
#[derive(Args)]
pub struct DownloadArgs {
    /// URL to download
    pub url: String,

    /// Destination file or directory (defaults to the URL's file name)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Download even if the destination exists
    #[arg(long)]
    pub overwrite: bool,

    /// Expected SHA-1 of the file (a prefix is enough)
    #[arg(long, value_name = "HASH")]
    pub sha1: Option<String>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl DownloadArgs {
    fn request(&self) -> DownloadRequest {
        let mut request = DownloadRequest::new(&self.url).overwrite(self.overwrite);
        if let Some(ref output) = self.output {
            request = request.path(output);
        }
        if let Some(ref hash) = self.sha1 {
            request = request.sha1(hash);
        }
        request
    }
}

/// Run the download command, printing the destination path.
pub fn run(args: &DownloadArgs) -> Result<()> {
    let progress = DownloadProgress::new(args.quiet);
    let path = download(&args.request(), &progress)?;
    println!("{}", path.display());
    Ok(())
}

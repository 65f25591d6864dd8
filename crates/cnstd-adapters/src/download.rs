//! HTTP downloads with progress reporting and SHA-1 verification.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use cnstd_core::{ProgressEvent, ProgressSink};
use tracing::{debug, info, warn};

use crate::checksum::check_sha1;
use crate::data_dir::expand_tilde;

/// Bytes read from the response per write.
const CHUNK_SIZE: usize = 64 * 1024;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// A file to fetch.
#[derive(Debug, Clone, Default)]
pub struct DownloadRequest {
    /// URL to download.
    pub url: String,
    /// Destination file or directory. Defaults to the URL's file name in the
    /// current directory.
    pub path: Option<PathBuf>,
    /// Download even if the destination already exists.
    pub overwrite: bool,
    /// Expected SHA-1 (hex, possibly abbreviated). An existing file that does
    /// not match is replaced.
    pub sha1: Option<String>,
}

impl DownloadRequest {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub const fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    #[must_use]
    pub fn sha1(mut self, hash: impl Into<String>) -> Self {
        self.sha1 = Some(hash.into());
        self
    }

    /// Resolves where the file will be written.
    #[must_use]
    pub fn destination(&self) -> PathBuf {
        let file_name = file_name_from_url(&self.url);
        match &self.path {
            None => PathBuf::from(file_name),
            Some(p) => {
                let p = expand_tilde(p);
                if p.is_dir() {
                    p.join(file_name)
                } else {
                    p
                }
            }
        }
    }
}

/// Last path segment of a URL, without query or fragment.
fn file_name_from_url(url: &str) -> &str {
    let url = url.split(['?', '#']).next().unwrap_or(url);
    url.rsplit('/').next().unwrap_or(url)
}

/// Downloads `request.url` unless a valid copy is already in place.
///
/// Returns the path of the file. The body is streamed to a `.part` file next
/// to the destination and renamed once complete.
///
/// # Errors
///
/// Returns an error if:
/// - The destination directory cannot be created
/// - The server does not answer with a success status
/// - Writing the file fails
/// - The downloaded file does not match the expected SHA-1
pub fn download(request: &DownloadRequest, progress: &dyn ProgressSink) -> Result<PathBuf> {
    let dest = request.destination();
    let name = dest
        .file_name()
        .map_or_else(|| request.url.clone(), |n| n.to_string_lossy().into_owned());

    if let Some(reason) = skip_reason(request, &dest)? {
        debug!("Not downloading {}: {reason}", dest.display());
        progress.on_event(ProgressEvent::Skipped { name, reason });
        return Ok(dest);
    }

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    info!("Downloading {} from {}", dest.display(), request.url);
    let part = part_path(&dest);
    let bytes = match fetch_into(request, &part, &dest, &name, progress) {
        Ok(bytes) => bytes,
        Err(e) => {
            let _ = fs::remove_file(&part);
            progress.on_event(ProgressEvent::Failed {
                name,
                reason: format!("{e:#}"),
            });
            return Err(e);
        }
    };

    info!("Downloaded {} ({bytes} bytes)", dest.display());
    progress.on_event(ProgressEvent::Finished { name, bytes });
    Ok(dest)
}

/// Fetches into `part`, moves it to `dest` and checks the expected hash.
fn fetch_into(
    request: &DownloadRequest,
    part: &Path,
    dest: &Path,
    name: &str,
    progress: &dyn ProgressSink,
) -> Result<u64> {
    let bytes = fetch(&request.url, part, name, progress)?;
    fs::rename(part, dest)
        .with_context(|| format!("Failed to move download into {}", dest.display()))?;

    if let Some(expected) = &request.sha1 {
        if !check_sha1(dest, expected)? {
            anyhow::bail!(
                "File {} is downloaded but the content hash does not match. \
                 The repo may be outdated or download may be incomplete. \
                 If the repo URL is overridden, consider switching to the default repo.",
                dest.display()
            );
        }
    }
    Ok(bytes)
}

/// Why an existing destination can be kept, or `None` if it must be fetched.
fn skip_reason(request: &DownloadRequest, dest: &Path) -> Result<Option<String>> {
    if request.overwrite || !dest.exists() {
        return Ok(None);
    }
    match &request.sha1 {
        None => Ok(Some("already exists".to_string())),
        Some(expected) => {
            if check_sha1(dest, expected)? {
                Ok(Some("already exists with matching sha1".to_string()))
            } else {
                warn!(
                    "{} exists but its sha1 does not match, downloading again",
                    dest.display()
                );
                Ok(None)
            }
        }
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut s: OsString = dest.as_os_str().to_owned();
    s.push(".part");
    PathBuf::from(s)
}

/// Streams the body of `url` into `path`, returning the number of bytes written.
fn fetch(url: &str, path: &Path, name: &str, progress: &dyn ProgressSink) -> Result<u64> {
    let client = reqwest::blocking::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(None::<Duration>)
        .build()
        .context("Failed to build HTTP client")?;

    let mut response = client
        .get(url)
        .send()
        .with_context(|| format!("Failed downloading url {url}"))?;

    if !response.status().is_success() {
        anyhow::bail!(
            "Failed downloading url {url}: server returned {}",
            response.status()
        );
    }

    let total = response.content_length();
    progress.on_event(ProgressEvent::Started {
        name: name.to_string(),
        total,
    });

    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut downloaded = 0u64;

    loop {
        let n = response
            .read(&mut buf)
            .with_context(|| format!("Failed to read response from {url}"))?;
        if n == 0 {
            break;
        }
        writer
            .write_all(&buf[..n])
            .with_context(|| format!("Failed to write {}", path.display()))?;
        downloaded += n as u64;
        progress.on_event(ProgressEvent::Advanced {
            name: name.to_string(),
            downloaded,
        });
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;

    if let Some(expected) = total {
        if downloaded != expected {
            anyhow::bail!("Download of {url} incomplete: got {downloaded} of {expected} bytes");
        }
    }

    Ok(downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(file_name_from_url("https://h/a/b/model.zip"), "model.zip");
        assert_eq!(file_name_from_url("https://h/a/model.zip?dl=1#x"), "model.zip");
        assert_eq!(file_name_from_url("model.zip"), "model.zip");
    }

    #[test]
    fn test_destination_defaults_to_url_name() {
        let req = DownloadRequest::new("https://h/x/file.bin");
        assert_eq!(req.destination(), PathBuf::from("file.bin"));
    }

    #[test]
    fn test_destination_in_existing_directory() {
        let dir = std::env::temp_dir();
        let req = DownloadRequest::new("https://h/x/file.bin").path(&dir);
        assert_eq!(req.destination(), dir.join("file.bin"));
    }

    #[test]
    fn test_destination_explicit_file() {
        let req = DownloadRequest::new("https://h/x/file.bin").path("/tmp/not-a-dir/out.bin");
        assert_eq!(req.destination(), PathBuf::from("/tmp/not-a-dir/out.bin"));
    }

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("/a/b.zip")),
            PathBuf::from("/a/b.zip.part")
        );
    }
}

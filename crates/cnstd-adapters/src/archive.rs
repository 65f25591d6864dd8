//! Zip extraction for model bundles.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};
use zip::ZipArchive;

/// Keeps only normal components of an archive entry name.
///
/// Returns `None` when nothing is left, e.g. for `..` or `/`.
fn sanitize_entry_path(name: &str) -> Option<PathBuf> {
    let sanitized: PathBuf = Path::new(name)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();

    if sanitized.as_os_str().is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

/// Extracts every entry of `archive` below `dest`.
///
/// Entry names are stripped of `..`, root and prefix components so nothing
/// lands outside `dest`. Returns the paths of the extracted files.
///
/// # Errors
///
/// Returns an error if the archive cannot be read or a file cannot be written.
pub fn extract_zip(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(archive)
        .with_context(|| format!("Failed to open archive {}", archive.display()))?;
    let mut zip = ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("Invalid zip archive {}", archive.display()))?;

    let mut extracted = Vec::new();
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .with_context(|| format!("Failed to read entry {i} of {}", archive.display()))?;

        let raw_name = entry.name().to_string();
        let Some(relative) = sanitize_entry_path(&raw_name) else {
            warn!("Skipping invalid archive entry: {raw_name}");
            continue;
        };
        let target = dest.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let mut out = File::create(&target)
            .with_context(|| format!("Failed to create {}", target.display()))?;
        io::copy(&mut entry, &mut out)
            .with_context(|| format!("Failed to extract {raw_name}"))?;
        debug!("Extracted {}", target.display());
        extracted.push(target);
    }

    Ok(extracted)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use cnstd_test_support::{write_zip, ZipEntry};

    #[test]
    fn test_sanitize_entry_path() {
        assert_eq!(sanitize_entry_path("a/b.txt"), Some(PathBuf::from("a/b.txt")));
        assert_eq!(
            sanitize_entry_path("../../etc/passwd"),
            Some(PathBuf::from("etc/passwd"))
        );
        assert_eq!(sanitize_entry_path("/abs/x"), Some(PathBuf::from("abs/x")));
        assert_eq!(sanitize_entry_path(".."), None);
        assert_eq!(sanitize_entry_path("./"), None);
    }

    #[test]
    fn test_extract_zip_creates_tree() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("bundle.zip");
        write_zip(
            &archive,
            &[
                ZipEntry::dir("m/"),
                ZipEntry::file("m/w.params", b"123".to_vec()),
                ZipEntry::file("m/sub/c.json", b"{}".to_vec()),
            ],
        )
        .unwrap();

        let out = dir.path().join("out");
        let files = extract_zip(&archive, &out).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(fs::read(out.join("m/w.params")).unwrap(), b"123");
        assert!(out.join("m/sub/c.json").is_file());
    }

    #[test]
    fn test_extract_zip_contains_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("evil.zip");
        write_zip(&archive, &[ZipEntry::file("../escape.txt", b"x".to_vec())]).unwrap();

        let out = dir.path().join("out");
        extract_zip(&archive, &out).unwrap();
        assert!(out.join("escape.txt").is_file());
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[test]
    fn test_extract_invalid_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("broken.zip");
        fs::write(&archive, b"not a zip").unwrap();
        assert!(extract_zip(&archive, dir.path()).is_err());
    }
}

//! Gzip-tar extraction with path-traversal protection.
//!
//! Unpacks `.tar.gz` release archives into the staging area, refusing
//! entries that would escape it (zip-slip), and locates the top-level
//! directory the descriptor expects — by prefix, so archives whose root
//! directory carries a version suffix still resolve.

use std::path::{Component, Path, PathBuf};

/// Trait for unpacking release archives, enabling test mocking.
pub trait ArchiveExtractor {
    /// Extract the archive at `archive_path` into `dest_dir`.
    ///
    /// Returns the names of the top-level entries that were created, in
    /// archive order.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::PathTraversal`] if any entry attempts to
    /// escape the destination directory, [`ExtractError::Empty`] if the
    /// archive holds no entries, and [`ExtractError::Io`] for corrupt
    /// input or filesystem failures.
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> Result<Vec<String>, ExtractError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// I/O error during extraction, including corrupt gzip or tar input.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no entries.
    #[error("archive contains no entries")]
    Empty,
}

/// Default extractor using the `tar` and `flate2` crates.
///
/// Validates each entry path before extraction and preserves entry
/// permissions so installed binaries stay executable.
pub struct GzipTarExtractor;

impl ArchiveExtractor for GzipTarExtractor {
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> Result<Vec<String>, ExtractError> {
        let file = std::fs::File::open(archive_path)?;
        let decoder = flate2::read::GzDecoder::new(file);
        let mut archive = tar::Archive::new(decoder);
        archive.set_preserve_permissions(true);

        let mut top_level: Vec<String> = Vec::new();
        for entry_result in archive.entries()? {
            let mut entry = entry_result?;
            let entry_path = entry.path()?.into_owned();

            validate_entry_path(&entry_path)?;

            if let Some(Component::Normal(first)) = entry_path.components().next() {
                let name = first.to_string_lossy().into_owned();
                if !top_level.contains(&name) {
                    top_level.push(name);
                }
            }

            let dest_path = dest_dir.join(&entry_path);
            if let Some(parent) = dest_path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            entry.unpack(&dest_path)?;
        }

        if top_level.is_empty() {
            return Err(ExtractError::Empty);
        }

        Ok(top_level)
    }
}

/// Validate that a tar entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractError> {
    if path.is_absolute() {
        return Err(ExtractError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    for component in path.components() {
        if matches!(component, Component::ParentDir) {
            return Err(ExtractError::PathTraversal {
                path: path.display().to_string(),
            });
        }
    }
    Ok(())
}

/// Locate the extracted top-level directory whose name starts with
/// `prefix`.
///
/// Returns the lexicographically first match so the result is
/// deterministic when several directories share the prefix, and `None`
/// when no directory matches.
///
/// # Errors
///
/// Returns any I/O error from reading `dest_dir`.
pub fn locate_root(dest_dir: &Path, prefix: &str) -> std::io::Result<Option<PathBuf>> {
    let mut matches = Vec::new();
    for entry in std::fs::read_dir(dest_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(prefix) {
            matches.push(entry.path());
        }
    }
    matches.sort();
    Ok(matches.into_iter().next())
}

//! Invocation-scoped staging directory acquisition.
//!
//! Each installation attempt gets a fresh, uniquely-named staging
//! directory. The directory is a scoped resource: the returned guard
//! removes it and everything inside on drop, which covers normal return,
//! error return, and unwinding alike. No step outside the commit ever
//! writes anywhere else.

use camino::Utf8Path;
use tempfile::TempDir;

/// Prefix for staging directory names.
const STAGING_PREFIX: &str = "outfitter-";

/// Create a fresh staging directory for one installation attempt.
///
/// When `staging_root` is given the directory is created inside it,
/// otherwise inside the system temp dir.
///
/// # Errors
///
/// Returns any I/O error from creating the directory, including a missing
/// or unwritable staging root.
pub fn acquire(staging_root: Option<&Utf8Path>) -> std::io::Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(STAGING_PREFIX);
    match staging_root {
        Some(root) => builder.tempdir_in(root.as_std_path()),
        None => builder.tempdir(),
    }
}

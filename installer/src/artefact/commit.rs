//! Commit of verified, extracted files into the install location.
//!
//! The commit is the only step that mutates persistent system state.
//! Files land via copy-to-temporary-sibling plus rename, so an interrupted
//! copy never leaves a partially-written file at its final path, and an
//! exclusive advisory lock on the install location serialises concurrent
//! commits into the same directory.

use camino::{Utf8Path, Utf8PathBuf};
use fs2::FileExt;
use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Name of the advisory lock file under the install location.
const LOCK_FILE_NAME: &str = ".outfitter.lock";

/// Name of the throwaway file used to probe writability.
const WRITE_PROBE_NAME: &str = ".outfitter-write-probe";

/// Suffix of the temporary sibling a file is copied to before renaming.
const TEMP_SUFFIX: &str = ".outfitter-tmp";

/// Errors arising from the commit step.
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    /// The install location exists but cannot be written.
    #[error("install location {path} is not writable: {reason}")]
    NotWritable {
        /// The directory that rejected writes.
        path: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
    },

    /// An I/O operation failed while copying files into place.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Copy the contents of `source` into `dest`, preserving file modes.
///
/// `dest` is created if missing and probed for writability before any
/// artifact file is touched. The copy holds an exclusive lock on a lock
/// file under `dest` for its duration.
///
/// # Errors
///
/// Returns [`CommitError::NotWritable`] when the probe fails, and
/// [`CommitError::Io`] for any other filesystem failure.
pub fn commit_tree(source: &Path, dest: &Utf8Path) -> Result<(), CommitError> {
    std::fs::create_dir_all(dest.as_std_path())?;
    probe_writable(dest)?;

    let lock = lock_install_dir(dest)?;
    let result = copy_dir_contents(source, dest.as_std_path());
    drop(lock);
    result
}

/// Verify writability by creating and removing a throwaway file.
fn probe_writable(dest: &Utf8Path) -> Result<(), CommitError> {
    let probe_path = dest.join(WRITE_PROBE_NAME);
    match std::fs::write(probe_path.as_std_path(), b"probe") {
        Ok(()) => {
            let _ = std::fs::remove_file(probe_path.as_std_path());
            Ok(())
        }
        Err(e) => Err(CommitError::NotWritable {
            path: dest.to_owned(),
            reason: e.to_string(),
        }),
    }
}

/// Take an exclusive advisory lock on the install location.
///
/// The lock is released when the returned file handle is dropped.
fn lock_install_dir(dest: &Utf8Path) -> Result<std::fs::File, CommitError> {
    let lock_path = dest.join(LOCK_FILE_NAME);
    let file = std::fs::File::create(lock_path.as_std_path())?;
    file.lock_exclusive()?;
    Ok(file)
}

/// Recursively copy directory contents, files landing atomically.
fn copy_dir_contents(source: &Path, dest: &Path) -> Result<(), CommitError> {
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            let target = dest.join(entry.file_name());
            std::fs::create_dir_all(&target)?;
            copy_dir_contents(&entry.path(), &target)?;
        } else {
            place_file(&entry.path(), &entry.file_name(), dest)?;
        }
    }
    Ok(())
}

/// Copy `source` to a hidden temporary sibling in `dest_dir`, then rename
/// it to `name`. `std::fs::copy` carries the permission bits across, so
/// executables stay executable.
fn place_file(source: &Path, name: &OsStr, dest_dir: &Path) -> Result<(), CommitError> {
    let mut temp_name = OsString::from(".");
    temp_name.push(name);
    temp_name.push(TEMP_SUFFIX);
    let temp_path = dest_dir.join(&temp_name);

    std::fs::copy(source, &temp_path)?;
    if let Err(e) = std::fs::rename(&temp_path, dest_dir.join(name)) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(CommitError::Io(e));
    }
    Ok(())
}

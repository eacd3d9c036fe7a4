//! Side-effect-free command-presence probing.
//!
//! The provisioner's idempotency rests on a cheap "is this tool already
//! here?" check before any mutating step. The probe answers that question
//! against an explicit search path captured once at startup, so the core
//! never reads ambient `PATH` state mid-run.

use std::path::{Path, PathBuf};

/// Reports whether a name resolves as an executable on the search path.
///
/// Implementations must be free of side effects; the probe runs before
/// every installation step and on the happy path it is the only thing
/// that runs at all.
pub trait CommandProbe {
    /// Return true when `name` resolves to an executable file.
    fn resolves(&self, name: &str) -> bool;
}

/// Probes an explicit list of search-path directories.
///
/// # Examples
///
/// ```no_run
/// use outfitter_common::probe::{CommandProbe, PathProbe};
///
/// let probe = PathProbe::from_current_env();
/// if probe.resolves("git") {
///     println!("git is already installed");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PathProbe {
    entries: Vec<PathBuf>,
}

impl PathProbe {
    /// Build a probe over an explicit list of directories.
    #[must_use]
    pub fn new(entries: Vec<PathBuf>) -> Self {
        Self { entries }
    }

    /// Capture the process `PATH` into a probe.
    ///
    /// This is the one place the search path is read from the environment;
    /// the resulting probe is passed around explicitly thereafter.
    #[must_use]
    pub fn from_current_env() -> Self {
        let entries = std::env::var_os("PATH")
            .map(|raw| std::env::split_paths(&raw).collect())
            .unwrap_or_default();
        Self { entries }
    }
}

impl CommandProbe for PathProbe {
    fn resolves(&self, name: &str) -> bool {
        self.entries.iter().any(|dir| is_executable(&dir.join(name)))
    }
}

/// Whether `path` names a regular file the current user could execute.
#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Whether `path` names a regular file (non-Unix fallback).
#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn write_executable(dir: &Path, name: &str) {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, b"#!/bin/sh\n").expect("write script");
        let mut perms = std::fs::metadata(&path).expect("metadata").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).expect("set permissions");
    }

    #[cfg(unix)]
    #[test]
    fn resolves_executable_on_search_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        write_executable(dir.path(), "fakebin");

        let probe = PathProbe::new(vec![dir.path().to_owned()]);
        assert!(probe.resolves("fakebin"));
    }

    #[cfg(unix)]
    #[test]
    fn ignores_non_executable_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("not-a-binary");
        std::fs::write(&path, b"data").expect("write file");

        let probe = PathProbe::new(vec![dir.path().to_owned()]);
        assert!(!probe.resolves("not-a-binary"));
    }

    #[test]
    fn missing_name_does_not_resolve() {
        let dir = tempfile::tempdir().expect("temp dir");
        let probe = PathProbe::new(vec![dir.path().to_owned()]);
        assert!(!probe.resolves("nowhere-to-be-found"));
    }

    #[test]
    fn empty_search_path_resolves_nothing() {
        let probe = PathProbe::new(Vec::new());
        assert!(!probe.resolves("sh"));
    }

    #[cfg(unix)]
    #[test]
    fn directories_are_not_executables() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::create_dir(dir.path().join("subdir")).expect("mkdir");

        let probe = PathProbe::new(vec![dir.path().to_owned()]);
        assert!(!probe.resolves("subdir"));
    }
}

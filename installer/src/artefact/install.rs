//! The artifact installation pipeline.
//!
//! Presence check, staging acquisition, fetch, verify, extract, locate,
//! commit — in that order. Each step is a total function of the previous
//! step's success, every step before the commit operates solely inside the
//! staging area, and the presence check short-circuits with no side
//! effects at all, which is what makes a provisioning run safe to
//! re-execute.

use crate::artefact::commit::commit_tree;
use crate::artefact::descriptor::{InstallLayout, InstallOutcome, ToolSpec};
use crate::artefact::download::ArtefactFetcher;
use crate::artefact::extraction::{ArchiveExtractor, locate_root};
use crate::artefact::staging;
use crate::error::InstallError;
use camino::{Utf8Path, Utf8PathBuf};
use outfitter_common::digest::{self, Sha256Digest};
use outfitter_common::probe::CommandProbe;
use std::path::Path;

/// The fixed filesystem layout the installer commits into.
#[derive(Debug, Clone)]
pub struct InstallLocation {
    root: Utf8PathBuf,
}

impl InstallLocation {
    /// Build a location rooted at `root` (e.g. `/usr/local`).
    #[must_use]
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    /// The install root itself.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// The binary subdirectory for single-file tools.
    #[must_use]
    pub fn bin_dir(&self) -> Utf8PathBuf {
        self.root.join("bin")
    }

    /// The commit destination for a given layout.
    fn dest_for(&self, layout: InstallLayout) -> Utf8PathBuf {
        match layout {
            InstallLayout::Tree => self.root.clone(),
            InstallLayout::Bin => self.bin_dir(),
        }
    }
}

/// Installs checksum-verified tools into a fixed install location.
///
/// The probe, fetcher, and extractor are injected so tests can exercise
/// the pipeline without network access or a real install prefix.
pub struct Installer<'a> {
    probe: &'a dyn CommandProbe,
    fetcher: &'a dyn ArtefactFetcher,
    extractor: &'a dyn ArchiveExtractor,
    location: InstallLocation,
    staging_root: Option<Utf8PathBuf>,
}

impl<'a> Installer<'a> {
    /// Build an installer over the given collaborators and location.
    #[must_use]
    pub fn new(
        probe: &'a dyn CommandProbe,
        fetcher: &'a dyn ArtefactFetcher,
        extractor: &'a dyn ArchiveExtractor,
        location: InstallLocation,
    ) -> Self {
        Self {
            probe,
            fetcher,
            extractor,
            location,
            staging_root: None,
        }
    }

    /// Create staging areas under `root` instead of the system temp dir.
    #[must_use]
    pub fn with_staging_root(mut self, root: Utf8PathBuf) -> Self {
        self.staging_root = Some(root);
        self
    }

    /// Ensure the described tool is present and verified.
    ///
    /// Repeated invocations with the same descriptor are safe: once the
    /// tool resolves on the search path, the call returns
    /// [`InstallOutcome::AlreadyPresent`] without touching the network or
    /// the filesystem.
    #[must_use]
    pub fn install(&self, spec: &ToolSpec) -> InstallOutcome {
        if self.probe.resolves(&spec.name) {
            log::debug!("{} already resolves on the search path", spec.name);
            return InstallOutcome::AlreadyPresent;
        }
        match self.run_pipeline(spec) {
            Ok(()) => InstallOutcome::Installed,
            Err(error) => InstallOutcome::Failed(error),
        }
    }

    /// Fetch, verify, extract, locate, and commit one descriptor.
    fn run_pipeline(&self, spec: &ToolSpec) -> Result<(), InstallError> {
        let staging =
            staging::acquire(self.staging_root.as_deref()).map_err(|e| InstallError::Fetch {
                tool: spec.name.clone(),
                cause: format!("could not create staging area: {e}"),
            })?;

        let archive_path = staging.path().join(spec.archive_file_name());
        self.fetcher
            .fetch(&spec.source_url, &archive_path)
            .map_err(|e| InstallError::Fetch {
                tool: spec.name.clone(),
                cause: e.to_string(),
            })?;

        if let Some(expected) = &spec.expected_digest {
            verify_digest(&spec.name, &archive_path, expected)?;
        }

        let unpack_dir = staging.path().join("unpacked");
        std::fs::create_dir_all(&unpack_dir).map_err(|e| InstallError::Extraction {
            tool: spec.name.clone(),
            cause: e.to_string(),
        })?;
        self.extractor
            .extract(&archive_path, &unpack_dir)
            .map_err(|e| InstallError::Extraction {
                tool: spec.name.clone(),
                cause: e.to_string(),
            })?;

        let prefix = spec.root_prefix();
        let root_dir = locate_root(&unpack_dir, prefix)
            .map_err(|e| InstallError::Extraction {
                tool: spec.name.clone(),
                cause: e.to_string(),
            })?
            .ok_or_else(|| InstallError::Layout {
                tool: spec.name.clone(),
                cause: format!("no extracted directory matching '{prefix}*'"),
            })?;

        let dest = self.location.dest_for(spec.layout);
        commit_tree(&root_dir, &dest).map_err(|e| InstallError::Commit {
            tool: spec.name.clone(),
            cause: e.to_string(),
        })?;

        log::debug!("{} committed to {dest}", spec.name);
        Ok(())
    }
}

/// Compare the download's digest against the descriptor's expectation.
///
/// A mismatch is a hard stop: never ignored, never retried with a relaxed
/// check. Nothing has touched the install location at this point.
fn verify_digest(
    tool: &str,
    archive_path: &Path,
    expected: &Sha256Digest,
) -> Result<(), InstallError> {
    let actual = digest::hash_file(archive_path).map_err(|e| InstallError::Verification {
        tool: tool.to_owned(),
        cause: format!("could not hash download: {e}"),
    })?;
    if actual != *expected {
        return Err(InstallError::Verification {
            tool: tool.to_owned(),
            cause: format!("expected {expected}, computed {actual}"),
        });
    }
    Ok(())
}

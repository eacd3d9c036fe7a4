//! Semantic error types for pipeline and step failures.
//!
//! The artifact pipeline has its own closed taxonomy so an operator can
//! tell a transient network failure from a stale digest in the manifest;
//! everything else the provisioner does surfaces through [`StepError`].

use thiserror::Error;

/// Errors from the checksum-verified artifact installation pipeline.
///
/// Every variant carries the descriptor's tool name and a human-readable
/// cause. None of these are retried automatically; the orchestrator decides
/// whether a failure aborts the run.
#[derive(Debug, Error)]
pub enum InstallError {
    /// Network failure, non-2xx response, or write failure into staging.
    #[error("download failed for {tool}: {cause}")]
    Fetch {
        /// Name of the tool whose download failed.
        tool: String,
        /// Description of the failure.
        cause: String,
    },

    /// The downloaded content does not match the expected digest.
    #[error("checksum verification failed for {tool}: {cause}")]
    Verification {
        /// Name of the tool whose archive failed verification.
        tool: String,
        /// Expected-versus-computed digest detail.
        cause: String,
    },

    /// The archive is corrupt, unsupported, or empty.
    #[error("archive extraction failed for {tool}: {cause}")]
    Extraction {
        /// Name of the tool whose archive could not be unpacked.
        tool: String,
        /// Description of the extraction failure.
        cause: String,
    },

    /// Extraction succeeded but the expected top-level directory is missing.
    #[error("extracted layout mismatch for {tool}: {cause}")]
    Layout {
        /// Name of the tool whose archive had an unexpected layout.
        tool: String,
        /// Description of what was expected.
        cause: String,
    },

    /// The copy into the install location failed.
    #[error("install commit failed for {tool}: {cause}")]
    Commit {
        /// Name of the tool whose commit failed.
        tool: String,
        /// Description of the filesystem failure.
        cause: String,
    },
}

impl InstallError {
    /// The name of the tool the error is about.
    #[must_use]
    pub fn tool(&self) -> &str {
        match self {
            Self::Fetch { tool, .. }
            | Self::Verification { tool, .. }
            | Self::Extraction { tool, .. }
            | Self::Layout { tool, .. }
            | Self::Commit { tool, .. } => tool,
        }
    }
}

/// Errors from provisioning steps outside the artifact pipeline.
#[derive(Debug, Error)]
pub enum StepError {
    /// The manifest could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// The target user could not be resolved.
    #[error(transparent)]
    User(#[from] outfitter_common::user::UserError),

    /// A package-manager invocation failed.
    #[error("package manager {operation} failed: {message}")]
    PackageManager {
        /// The operation that failed (update or install).
        operation: &'static str,
        /// Description of the failure.
        message: String,
    },

    /// A third-party installer command failed.
    #[error("installer for {name} failed: {message}")]
    Script {
        /// The executable the script was expected to provide.
        name: String,
        /// Description of the failure.
        message: String,
    },

    /// Runtime version-manager setup failed.
    #[error("runtime setup for {runtime} failed: {message}")]
    Runtime {
        /// The runtime that could not be set up.
        runtime: String,
        /// Description of the failure.
        message: String,
    },

    /// Shell configuration could not be applied.
    #[error("shell configuration failed: {message}")]
    ShellConfig {
        /// Description of the failure.
        message: String,
    },

    /// A global git alias could not be set.
    #[error("git alias {alias} could not be set: {message}")]
    GitAlias {
        /// The alias name.
        alias: String,
        /// Description of the failure.
        message: String,
    },

    /// An artifact installation failed.
    #[error(transparent)]
    Artifact(#[from] InstallError),

    /// The plan could not be rendered as JSON.
    #[error("could not render plan: {0}")]
    Render(#[from] serde_json::Error),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`StepError`].
pub type StepResult<T> = std::result::Result<T, StepError>;

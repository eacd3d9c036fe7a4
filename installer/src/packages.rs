//! System package-manager wrapper.
//!
//! The package manager is a black box: the wrapper runs the configured
//! program with the configured arguments, treats a zero exit status as
//! success, and surfaces trimmed stderr otherwise. It makes no attempt to
//! model package state or dependencies.

use crate::config::PackageConfig;
use crate::error::{StepError, StepResult};
use outfitter_common::exec::{CommandExecutor, Invocation, stderr_text};
use std::time::Duration;

/// Generous bound for package-manager invocations; index refreshes and
/// large installs are slow, but they must not hang forever.
const PACKAGE_TIMEOUT: Duration = Duration::from_secs(1800);

/// Thin wrapper over the configured system package manager.
pub struct PackageManager<'a> {
    executor: &'a dyn CommandExecutor,
    config: &'a PackageConfig,
}

impl<'a> PackageManager<'a> {
    /// Build a wrapper over the given executor and configuration.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor, config: &'a PackageConfig) -> Self {
        Self { executor, config }
    }

    /// Refresh the package index.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::PackageManager`] when the invocation fails or
    /// exits non-zero.
    pub fn update(&self) -> StepResult<()> {
        self.run("update", self.config.update_args.clone())
    }

    /// Install the configured packages. A no-op on an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::PackageManager`] when the invocation fails or
    /// exits non-zero.
    pub fn install(&self) -> StepResult<()> {
        if self.config.names.is_empty() {
            return Ok(());
        }
        let mut args = self.config.install_args.clone();
        args.extend(self.config.names.iter().cloned());
        self.run("install", args)
    }

    fn run(&self, operation: &'static str, args: Vec<String>) -> StepResult<()> {
        let invocation =
            Invocation::new(self.config.manager.clone(), args).with_timeout(PACKAGE_TIMEOUT);
        let output = self
            .executor
            .run(&invocation)
            .map_err(|e| StepError::PackageManager {
                operation,
                message: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(StepError::PackageManager {
                operation,
                message: stderr_text(&output),
            });
        }
        Ok(())
    }
}

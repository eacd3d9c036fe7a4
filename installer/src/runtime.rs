//! Version-manager-installed runtime setup.
//!
//! Runtimes like Node are owned by a per-user version manager rather than
//! the system package manager. The step probes for the runtime executable
//! and, when absent, asks the configured version manager to install the
//! pinned version — always as the target user, since version managers
//! keep their state in the user's home.

use crate::config::RuntimeConfig;
use crate::error::{StepError, StepResult};
use outfitter_common::exec::{CommandExecutor, Invocation, stderr_text};
use outfitter_common::probe::CommandProbe;
use outfitter_common::user::TargetUser;

/// The outcome of the runtime step.
#[derive(Debug, PartialEq, Eq)]
pub enum RuntimeOutcome {
    /// The runtime already resolves; nothing was run.
    AlreadyPresent,
    /// The version manager installed the pinned version.
    Installed,
}

/// Ensure the configured runtime version is installed.
///
/// # Errors
///
/// Returns [`StepError::Runtime`] when the version manager cannot be run
/// or exits non-zero.
pub fn ensure_runtime(
    executor: &dyn CommandExecutor,
    probe: &dyn CommandProbe,
    config: &RuntimeConfig,
    user: &TargetUser,
) -> StepResult<RuntimeOutcome> {
    if probe.resolves(&config.runtime) {
        log::debug!("{} already resolves; skipping version manager", config.runtime);
        return Ok(RuntimeOutcome::AlreadyPresent);
    }

    let mut args = config.install_args.clone();
    args.push(config.version.clone());
    let invocation = Invocation::new(config.manager.clone(), args).as_user(user);

    let output = executor.run(&invocation).map_err(|e| StepError::Runtime {
        runtime: config.runtime.clone(),
        message: e.to_string(),
    })?;
    if !output.status.success() {
        return Err(StepError::Runtime {
            runtime: config.runtime.clone(),
            message: stderr_text(&output),
        });
    }
    Ok(RuntimeOutcome::Installed)
}

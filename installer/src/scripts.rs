//! Third-party installer command execution.
//!
//! Some tools ship their own installers. Those stay exactly what they
//! are: isolated external-process invocations guarded by a presence probe,
//! optionally run as the target user. Their internals are not modelled
//! here.

use crate::config::ScriptConfig;
use crate::error::{StepError, StepResult};
use outfitter_common::exec::{CommandExecutor, Invocation, stderr_text};
use outfitter_common::probe::CommandProbe;
use outfitter_common::user::TargetUser;

/// The outcome of one installer-command step.
#[derive(Debug, PartialEq, Eq)]
pub enum ScriptOutcome {
    /// The provided executable already resolves; nothing was run.
    AlreadyPresent,
    /// The installer command ran to completion.
    Ran,
}

/// Run a third-party installer command unless its tool is already present.
///
/// # Errors
///
/// Returns [`StepError::Script`] when the command cannot be run or exits
/// non-zero.
pub fn run_installer(
    executor: &dyn CommandExecutor,
    probe: &dyn CommandProbe,
    script: &ScriptConfig,
    user: &TargetUser,
) -> StepResult<ScriptOutcome> {
    if probe.resolves(&script.provides) {
        log::debug!("{} already resolves; skipping installer", script.provides);
        return Ok(ScriptOutcome::AlreadyPresent);
    }

    let mut invocation = Invocation::new(script.program.clone(), script.args.clone());
    if script.run_as_user {
        invocation = invocation.as_user(user);
    }

    let output = executor.run(&invocation).map_err(|e| StepError::Script {
        name: script.provides.clone(),
        message: e.to_string(),
    })?;
    if !output.status.success() {
        return Err(StepError::Script {
            name: script.provides.clone(),
            message: stderr_text(&output),
        });
    }
    Ok(ScriptOutcome::Ran)
}

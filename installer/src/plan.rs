//! Provisioning plan construction and fail-fast execution.
//!
//! The orchestrator owns the continue-versus-abort decision: steps run in
//! manifest order and the first error stops the run. The installer and
//! the collaborator steps only ever report; they never decide.

use crate::artefact::descriptor::InstallOutcome;
use crate::artefact::download::ArtefactFetcher;
use crate::artefact::extraction::ArchiveExtractor;
use crate::artefact::install::{InstallLocation, Installer};
use crate::config::Manifest;
use crate::error::{StepError, StepResult};
use crate::git::apply_aliases;
use crate::output::write_line;
use crate::packages::PackageManager;
use crate::runtime::{RuntimeOutcome, ensure_runtime};
use crate::scripts::{ScriptOutcome, run_installer};
use crate::shellcfg;
use outfitter_common::exec::CommandExecutor;
use outfitter_common::probe::CommandProbe;
use outfitter_common::user::TargetUser;
use serde::Serialize;
use std::fmt::Display;
use std::io::Write;

/// Everything a provisioning run shells out through.
///
/// Bundled so the orchestrator takes one injected seam instead of four.
pub struct Collaborators<'a> {
    /// External command executor.
    pub executor: &'a dyn CommandExecutor,
    /// Command-presence probe.
    pub probe: &'a dyn CommandProbe,
    /// Release archive fetcher.
    pub fetcher: &'a dyn ArtefactFetcher,
    /// Release archive extractor.
    pub extractor: &'a dyn ArchiveExtractor,
}

/// Step-skipping switches from the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepFilter {
    /// Skip the package-manager steps.
    pub skip_packages: bool,
    /// Skip checksum-verified tool installation.
    pub skip_tools: bool,
    /// Skip third-party installer commands.
    pub skip_scripts: bool,
    /// Skip runtime version-manager setup.
    pub skip_runtime: bool,
    /// Skip shell configuration.
    pub skip_shell: bool,
    /// Skip git alias configuration.
    pub skip_aliases: bool,
}

/// Counters for a completed provisioning run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Tools the installer fetched, verified, and committed.
    pub tools_installed: usize,
    /// Tools that already resolved on the search path.
    pub tools_already_present: usize,
    /// Steps that ran to completion, including no-op steps.
    pub steps_completed: usize,
}

/// One renderable entry of the provisioning plan.
#[derive(Debug, Serialize)]
pub struct PlanEntry {
    /// Step category.
    pub kind: &'static str,
    /// Human-oriented description.
    pub detail: String,
}

/// Run the manifest's steps in order, stopping at the first failure.
///
/// # Errors
///
/// Returns the first step's error; nothing after the failing step runs.
pub fn run(
    manifest: &Manifest,
    user: &TargetUser,
    deps: &Collaborators<'_>,
    filter: &StepFilter,
    quiet: bool,
    stderr: &mut dyn Write,
) -> StepResult<RunReport> {
    let mut report = RunReport::default();

    run_package_steps(manifest, deps, filter, quiet, stderr, &mut report)?;
    run_tool_steps(manifest, deps, filter, quiet, stderr, &mut report)?;
    run_script_steps(manifest, user, deps, filter, quiet, stderr, &mut report)?;
    run_runtime_step(manifest, user, deps, filter, quiet, stderr, &mut report)?;
    run_shell_step(manifest, user, deps, filter, quiet, stderr, &mut report)?;
    run_alias_step(manifest, user, deps, filter, quiet, stderr, &mut report)?;

    Ok(report)
}

fn run_package_steps(
    manifest: &Manifest,
    deps: &Collaborators<'_>,
    filter: &StepFilter,
    quiet: bool,
    stderr: &mut dyn Write,
    report: &mut RunReport,
) -> StepResult<()> {
    if filter.skip_packages {
        return Ok(());
    }
    let Some(packages) = &manifest.packages else {
        return Ok(());
    };

    let manager = PackageManager::new(deps.executor, packages);
    if packages.update {
        progress(
            quiet,
            stderr,
            format!("Refreshing {} package index...", packages.manager),
        );
        manager.update()?;
        report.steps_completed += 1;
    }
    if !packages.names.is_empty() {
        progress(
            quiet,
            stderr,
            format!("Installing {} system package(s)...", packages.names.len()),
        );
        manager.install()?;
        report.steps_completed += 1;
    }
    Ok(())
}

fn run_tool_steps(
    manifest: &Manifest,
    deps: &Collaborators<'_>,
    filter: &StepFilter,
    quiet: bool,
    stderr: &mut dyn Write,
    report: &mut RunReport,
) -> StepResult<()> {
    if filter.skip_tools || manifest.tools.is_empty() {
        return Ok(());
    }

    let location = InstallLocation::new(manifest.install_root.clone());
    let mut installer = Installer::new(deps.probe, deps.fetcher, deps.extractor, location);
    if let Some(root) = &manifest.staging_root {
        installer = installer.with_staging_root(root.clone());
    }

    for tool in &manifest.tools {
        match installer.install(tool) {
            InstallOutcome::AlreadyPresent => {
                progress(quiet, stderr, format!("{} already present", tool.name));
                report.tools_already_present += 1;
            }
            InstallOutcome::Installed => {
                progress(quiet, stderr, format!("{} installed", tool.name));
                report.tools_installed += 1;
            }
            InstallOutcome::Failed(error) => return Err(StepError::Artifact(error)),
        }
        report.steps_completed += 1;
    }
    Ok(())
}

fn run_script_steps(
    manifest: &Manifest,
    user: &TargetUser,
    deps: &Collaborators<'_>,
    filter: &StepFilter,
    quiet: bool,
    stderr: &mut dyn Write,
    report: &mut RunReport,
) -> StepResult<()> {
    if filter.skip_scripts {
        return Ok(());
    }
    for script in &manifest.scripts {
        match run_installer(deps.executor, deps.probe, script, user)? {
            ScriptOutcome::AlreadyPresent => {
                progress(quiet, stderr, format!("{} already present", script.provides));
            }
            ScriptOutcome::Ran => {
                progress(quiet, stderr, format!("{} installer ran", script.provides));
            }
        }
        report.steps_completed += 1;
    }
    Ok(())
}

fn run_runtime_step(
    manifest: &Manifest,
    user: &TargetUser,
    deps: &Collaborators<'_>,
    filter: &StepFilter,
    quiet: bool,
    stderr: &mut dyn Write,
    report: &mut RunReport,
) -> StepResult<()> {
    if filter.skip_runtime {
        return Ok(());
    }
    let Some(runtime) = &manifest.runtime else {
        return Ok(());
    };

    match ensure_runtime(deps.executor, deps.probe, runtime, user)? {
        RuntimeOutcome::AlreadyPresent => {
            progress(quiet, stderr, format!("{} already present", runtime.runtime));
        }
        RuntimeOutcome::Installed => {
            progress(
                quiet,
                stderr,
                format!("{} {} installed via {}", runtime.runtime, runtime.version, runtime.manager),
            );
        }
    }
    report.steps_completed += 1;
    Ok(())
}

fn run_shell_step(
    manifest: &Manifest,
    user: &TargetUser,
    deps: &Collaborators<'_>,
    filter: &StepFilter,
    quiet: bool,
    stderr: &mut dyn Write,
    report: &mut RunReport,
) -> StepResult<()> {
    if filter.skip_shell {
        return Ok(());
    }
    let Some(shell) = &manifest.shell else {
        return Ok(());
    };

    let shell_report = shellcfg::sync(deps.executor, shell, user)?;
    if shell_report.unchanged() {
        progress(quiet, stderr, "Shell configuration up to date");
    } else {
        progress(quiet, stderr, "Shell configuration updated");
    }
    report.steps_completed += 1;
    Ok(())
}

fn run_alias_step(
    manifest: &Manifest,
    user: &TargetUser,
    deps: &Collaborators<'_>,
    filter: &StepFilter,
    quiet: bool,
    stderr: &mut dyn Write,
    report: &mut RunReport,
) -> StepResult<()> {
    if filter.skip_aliases || manifest.git_aliases.is_empty() {
        return Ok(());
    }

    let count = apply_aliases(deps.executor, &manifest.git_aliases, user)?;
    progress(quiet, stderr, format!("{count} git alias(es) configured"));
    report.steps_completed += 1;
    Ok(())
}

/// Build the renderable plan for the manifest under the given filter.
#[must_use]
pub fn build_plan(manifest: &Manifest, filter: &StepFilter) -> Vec<PlanEntry> {
    let mut entries = Vec::new();

    if !filter.skip_packages {
        if let Some(packages) = &manifest.packages {
            if packages.update {
                entries.push(PlanEntry {
                    kind: "packages",
                    detail: format!("refresh {} package index", packages.manager),
                });
            }
            if !packages.names.is_empty() {
                entries.push(PlanEntry {
                    kind: "packages",
                    detail: format!(
                        "install via {}: {}",
                        packages.manager,
                        packages.names.join(", ")
                    ),
                });
            }
        }
    }

    if !filter.skip_tools {
        for tool in &manifest.tools {
            let verification = if tool.expected_digest.is_some() {
                "sha256-verified"
            } else {
                "unverified"
            };
            entries.push(PlanEntry {
                kind: "tool",
                detail: format!(
                    "{} from {} ({verification}) into {}",
                    tool.name, tool.source_url, manifest.install_root
                ),
            });
        }
    }

    if !filter.skip_scripts {
        for script in &manifest.scripts {
            entries.push(PlanEntry {
                kind: "script",
                detail: format!("{} via {}", script.provides, script.program),
            });
        }
    }

    if !filter.skip_runtime {
        if let Some(runtime) = &manifest.runtime {
            entries.push(PlanEntry {
                kind: "runtime",
                detail: format!(
                    "{} {} via {}",
                    runtime.runtime, runtime.version, runtime.manager
                ),
            });
        }
    }

    if !filter.skip_shell {
        if let Some(shell) = &manifest.shell {
            entries.push(PlanEntry {
                kind: "shell",
                detail: format!("sync {} and source it from {}", shell.target_name, shell.rc_file),
            });
        }
    }

    if !filter.skip_aliases && !manifest.git_aliases.is_empty() {
        entries.push(PlanEntry {
            kind: "git",
            detail: format!("{} global alias(es)", manifest.git_aliases.len()),
        });
    }

    entries
}

/// Render the plan as aligned text, one step per line.
#[must_use]
pub fn render_text(entries: &[PlanEntry]) -> String {
    if entries.is_empty() {
        return "Nothing to do".to_owned();
    }
    entries
        .iter()
        .map(|entry| format!("{:<10} {}", entry.kind, entry.detail))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the plan as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`StepError::Render`] if serialization fails.
pub fn render_json(entries: &[PlanEntry]) -> StepResult<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

/// Write a progress line unless quiet mode is on.
fn progress(quiet: bool, stderr: &mut dyn Write, message: impl Display) {
    if !quiet {
        write_line(stderr, message);
    }
}

//! Command-line argument definitions for outfitter.
//!
//! This module defines the command-line interface using clap. It is
//! separated from the main entrypoint to keep the binary small and
//! focused on orchestration.

use crate::plan::StepFilter;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Provision a developer workstation from a manifest.
#[derive(Parser, Debug)]
#[command(name = "outfitter")]
#[command(version, about)]
#[command(long_about = concat!(
    "Provision a developer workstation.\n\n",
    "outfitter reads a TOML manifest describing system packages, checksum-",
    "verified tool archives, third-party installer commands, a pinned ",
    "runtime version, a shell configuration fragment, and global git ",
    "aliases, then applies the steps in order.\n\n",
    "Every step is idempotent: tools that already resolve on the search ",
    "path are left alone, fragments are rewritten only when their content ",
    "changes, and the sourcing directive is appended at most once — so a ",
    "provisioning run is safe to re-execute after a failure.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Apply the default manifest:\n",
    "    $ sudo outfitter\n\n",
    "  Preview the steps without touching the system:\n",
    "    $ outfitter --dry-run\n\n",
    "  Apply a specific manifest, skipping the package manager:\n",
    "    $ sudo outfitter -m ./workstation.toml --skip-packages\n\n",
    "  Show the plan as JSON for scripting:\n",
    "    $ outfitter plan --json\n",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Provision arguments (used when no subcommand is given).
    #[command(flatten)]
    pub provision: ProvisionArgs,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Apply the provisioning manifest (default when no subcommand given).
    Provision(ProvisionArgs),

    /// Show the provisioning plan without executing it.
    Plan(PlanArgs),
}

/// Arguments for the provision command.
#[derive(Parser, Debug, Clone)]
pub struct ProvisionArgs {
    /// Path to the provisioning manifest.
    #[arg(short, long, value_name = "FILE", default_value = "outfitter.toml")]
    pub manifest: Utf8PathBuf,

    /// Show the resolved steps and exit without changing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,

    /// Skip the package-manager steps.
    #[arg(long)]
    pub skip_packages: bool,

    /// Skip checksum-verified tool installation.
    #[arg(long)]
    pub skip_tools: bool,

    /// Skip third-party installer commands.
    #[arg(long)]
    pub skip_scripts: bool,

    /// Skip runtime version-manager setup.
    #[arg(long)]
    pub skip_runtime: bool,

    /// Skip shell configuration.
    #[arg(long)]
    pub skip_shell: bool,

    /// Skip git alias configuration.
    #[arg(long)]
    pub skip_aliases: bool,
}

/// Arguments for the plan command.
#[derive(Parser, Debug, Clone)]
pub struct PlanArgs {
    /// Path to the provisioning manifest.
    #[arg(short, long, value_name = "FILE", default_value = "outfitter.toml")]
    pub manifest: Utf8PathBuf,

    /// Output in JSON format for scripting.
    #[arg(long)]
    pub json: bool,
}

impl ProvisionArgs {
    /// The step filter these arguments select.
    #[must_use]
    pub fn step_filter(&self) -> StepFilter {
        StepFilter {
            skip_packages: self.skip_packages,
            skip_tools: self.skip_tools,
            skip_scripts: self.skip_scripts,
            skip_runtime: self.skip_runtime,
            skip_shell: self.skip_shell,
            skip_aliases: self.skip_aliases,
        }
    }
}

impl Default for ProvisionArgs {
    /// Creates a `ProvisionArgs` instance with all flags disabled and the
    /// default manifest path, useful for testing and programmatic
    /// construction.
    fn default() -> Self {
        Self {
            manifest: Utf8PathBuf::from("outfitter.toml"),
            dry_run: false,
            verbosity: 0,
            quiet: false,
            skip_packages: false,
            skip_tools: false,
            skip_scripts: false,
            skip_runtime: false,
            skip_shell: false,
            skip_aliases: false,
        }
    }
}

impl Cli {
    /// Returns the effective provision arguments.
    ///
    /// If a `Provision` subcommand was provided, returns those arguments;
    /// otherwise returns the flattened arguments, so `outfitter` and
    /// `outfitter provision` behave identically.
    #[must_use]
    pub fn provision_args(&self) -> &ProvisionArgs {
        match &self.command {
            Some(Command::Provision(args)) => args,
            Some(Command::Plan(_)) | None => &self.provision,
        }
    }
}

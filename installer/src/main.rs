//! outfitter CLI entrypoint.
//!
//! This binary loads a provisioning manifest, wires the real collaborators
//! together (search-path probe, HTTP fetcher, gzip-tar extractor, system
//! command executor), and hands them to the plan orchestrator. It exits 0
//! on full success and 1 on the first unrecovered failure.

use clap::Parser;
use outfitter_common::exec::SystemCommandExecutor;
use outfitter_common::probe::PathProbe;
use outfitter_common::user::{TargetUser, UserEnv, UserError};
use outfitter_installer::artefact::download::HttpFetcher;
use outfitter_installer::artefact::extraction::GzipTarExtractor;
use outfitter_installer::cli::{Cli, Command, PlanArgs, ProvisionArgs};
use outfitter_installer::config::Manifest;
use outfitter_installer::error::StepResult;
use outfitter_installer::output::{success_message, write_line};
use outfitter_installer::plan::{self, Collaborators};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Map verbosity flags to a log filter, letting `RUST_LOG` override.
fn init_logging(cli: &Cli) {
    let args = cli.provision_args();
    let level = if args.quiet {
        log::LevelFilter::Error
    } else {
        match args.verbosity {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> StepResult<()> {
    match &cli.command {
        Some(Command::Plan(args)) => run_plan(args, stdout),
        Some(Command::Provision(_)) | None => run_provision(cli.provision_args(), stdout, stderr),
    }
}

/// Render the provisioning plan without executing anything.
fn run_plan(args: &PlanArgs, stdout: &mut dyn Write) -> StepResult<()> {
    let manifest = Manifest::load(&args.manifest)?;
    let entries = plan::build_plan(&manifest, &plan::StepFilter::default());
    let rendered = if args.json {
        plan::render_json(&entries)?
    } else {
        plan::render_text(&entries)
    };
    write_line(stdout, rendered);
    Ok(())
}

/// Apply the manifest's steps, or just show them under `--dry-run`.
fn run_provision(
    args: &ProvisionArgs,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> StepResult<()> {
    let manifest = Manifest::load(&args.manifest)?;
    let filter = args.step_filter();

    if args.dry_run {
        write_line(stderr, "Dry run - no changes will be made");
        write_line(stdout, plan::render_text(&plan::build_plan(&manifest, &filter)));
        return Ok(());
    }

    let user = resolve_user(&manifest, &UserEnv::from_process())?;
    let executor = SystemCommandExecutor;
    let probe = PathProbe::from_current_env();
    let fetcher = HttpFetcher::default();
    let deps = Collaborators {
        executor: &executor,
        probe: &probe,
        fetcher: &fetcher,
        extractor: &GzipTarExtractor,
    };

    let report = plan::run(&manifest, &user, &deps, &filter, args.quiet, stderr)?;
    if !args.quiet {
        write_line(stderr, success_message(&report));
    }
    Ok(())
}

/// Resolve the user on whose behalf user-scoped steps run.
///
/// A manifest override wins; it drops privileges whenever the invoking
/// user is not already the target user. Without an override the user is
/// resolved from the captured environment evidence.
fn resolve_user(manifest: &Manifest, env: &UserEnv) -> Result<TargetUser, UserError> {
    match &manifest.user {
        Some(config) => {
            let elevated = env.current_user.as_deref() != Some(config.name.as_str());
            Ok(TargetUser::with_home(
                &config.name,
                config.home.clone(),
                elevated,
            ))
        }
        None => TargetUser::resolve(env),
    }
}

fn exit_code_for_run_result(result: StepResult<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_line(stderr, err);
            1
        }
    }
}

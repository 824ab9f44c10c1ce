//! CLI command handling
//!
//! Turns parsed flags into a harness run and formats the result.

mod workdir;

pub use workdir::WorkDir;

use std::env;
use std::time::Duration;

use crate::commands::RunArgs;
use crate::common::{HarnessConfig, Result, Workspace};
use crate::testing::{
    DryRunDriver, Driver, Registry, Reporter, RunConfig, RunSummary, Runner, ShellDriver,
};

/// Build the per-run settings from flags layered over the config file
pub fn run_config(args: &RunArgs, config: &HarnessConfig) -> RunConfig {
    let defaults = RunConfig::from_config(config);
    RunConfig {
        verbose: args.verbose && !args.quiet,
        dry_run: args.debug,
        tests: args.tests.clone(),
        policy: args.policy.unwrap_or(defaults.policy),
        timeout: args
            .timeout
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout),
    }
}

/// Run the harness and return the process exit status
pub async fn dispatch(args: RunArgs) -> Result<i32> {
    let config = HarnessConfig::load(args.config.as_deref())?;
    let registry = Registry::new(&config);

    if args.list {
        print_registry(&registry, args.json)?;
        return Ok(0);
    }

    let run = run_config(&args, &config);
    tracing::debug!(?run, "run configuration");

    let session = if args.nosetup {
        None
    } else {
        Some(WorkDir::enter(&config.paths.test_dir())?)
    };

    let workspace = Workspace::new(env::current_dir()?, &config);
    check_executable(&workspace);

    let driver: Box<dyn Driver> = if run.dry_run {
        Box::new(DryRunDriver)
    } else {
        Box::new(ShellDriver::new(run.timeout))
    };

    let mut runner = Runner::new(&config, &run, &workspace, driver.as_ref());
    if args.json {
        runner = runner.with_reporter(Reporter::silent());
    }
    let summary = runner.run(&registry).await;

    // Leave the build directory even when the run aborted
    if let Some(session) = session {
        if args.nocleanup {
            tracing::debug!("cleanup skipped");
        } else {
            session.leave(&config.paths.parent)?;
        }
    }

    let summary = summary?;
    report(&summary, &runner, args.json)?;
    Ok(summary.exit_code)
}

fn report(summary: &RunSummary, runner: &Runner<'_>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        runner.reporter().summary(summary);
    }
    Ok(())
}

fn print_registry(registry: &Registry, json: bool) -> Result<()> {
    let scenarios = registry.list();
    if json {
        println!("{}", serde_json::to_string_pretty(&scenarios)?);
        return Ok(());
    }

    println!("Scenarios:");
    for info in scenarios {
        let marker = if info.default { "" } else { " (not in default set)" };
        println!("  {:<14} {}{}", info.key, info.description, marker);
    }
    Ok(())
}

/// Warn early when the target cannot be found; the shell would only say 127
fn check_executable(workspace: &Workspace) {
    let exe = workspace.executable();
    match which::which(exe) {
        Ok(path) => tracing::debug!(path = %path.display(), "resolved target"),
        Err(e) => tracing::warn!(
            executable = %exe.display(),
            error = %e,
            "target executable not found; scenarios will fail"
        ),
    }
}

//! adsk-purge - Autodesk leftover removal for Windows hosts
//!
//! Runs Autodesk's own uninstallers, then deletes the folders, FLEXnet
//! licensing files and registry keys they leave behind. The run is gated on
//! administrator rights and an interactive Y/N confirmation.

use clap::Parser;
use std::io::{self, Write};
use std::process;

mod config;
mod error;
mod launcher;
mod operator;
mod outcome;
mod privilege;
mod purge;
mod registry;
mod runner;
mod targets;

use config::{CleanupConfig, LockedFilePolicy};
use error::CleanupError;
use launcher::SystemLauncher;
use operator::ConsoleOperator;
use outcome::RunReport;
use purge::StdDeleter;
use runner::CleanupRunner;

/// The main CLI struct parsed by clap
#[derive(Parser, Debug)]
#[command(name = "adsk-purge")]
#[command(version)]
#[command(about = "Remove leftover Autodesk software, files and registry keys", long_about = None)]
struct Cli {
    /// Report what would be removed without launching or deleting anything
    #[arg(long)]
    dry_run: bool,

    /// Print the collected step report as JSON when the run completes
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,

    /// How to report entries that could not be deleted during purges
    #[arg(long, value_enum, default_value_t = LockedFilePolicy::Silent)]
    locked_files: LockedFilePolicy,

    /// Answer the confirmation prompt with yes
    #[arg(long, short = 'y')]
    yes: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// Prints the finished report and returns the process exit code
///
/// An aborted run has already printed its reason; the error only goes to
/// the debug log.
fn finish(result: Result<RunReport, CleanupError>, json: bool, out: &mut dyn Write) -> i32 {
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            log::debug!("run aborted: {}", e);
            return 1;
        }
    };

    let written = if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => writeln!(out, "{}", text),
            Err(e) => {
                log::error!("failed to serialize report: {}", e);
                Ok(())
            }
        }
    } else {
        writeln!(out, "\n{}", report)
    };
    if let Err(e) = written {
        log::warn!("could not print the report: {}", e);
    }
    0
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = CleanupConfig::from_env()
        .with_elevated(privilege::is_elevated())
        .with_dry_run(cli.dry_run)
        .with_assume_yes(cli.yes)
        .with_locked_files(cli.locked_files);

    log::debug!("resolved targets: {:#?}", config.targets);

    let mut operator = ConsoleOperator::stdio();
    let launcher = SystemLauncher;
    let registry = registry::system_registry();
    let deleter = StdDeleter;
    let mut console = io::stdout();

    let result = CleanupRunner::new(
        config,
        &mut operator,
        &launcher,
        registry.as_ref(),
        &deleter,
        &mut console,
    )
    .run();

    let code = finish(result, cli.json, &mut io::stdout());
    if code != 0 {
        process::exit(code);
    }
}

//! `markrun run`, `markrun list` and `markrun labels`.
//!
//! Each command builds a registry from the built-in and file suites, applies
//! the selection flags and maps the outcome (or the first error) to an exit
//! status.

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::args::{Command, MarkrunArgs, SelectArgs, SourceArgs};
use crate::cli::output::{print_case_list, print_labels, ConsoleSink};
use crate::config::{EmptySelectionPolicy, HarnessConfig};
use crate::errors::{HarnessError, Result};
use crate::registry::{CaseId, Registry, Selection};
use crate::report::{summarize, ExitStatus, Report};
use crate::runner::Runner;
use crate::select::parse_expression;
use crate::{discovery, suites};

pub mod args;
pub mod output;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "MARKRUN_LOG";

/// The main entry point for the CLI.
pub fn run() -> ExitCode {
    let args = MarkrunArgs::parse();
    init_tracing(args.verbose, args.debug);

    match dispatch(args) {
        Ok(status) => status.into(),
        Err(e) => {
            let status = ExitStatus::from_error(&e);
            eprintln!("{:?}", miette::Report::new(e));
            status.into()
        }
    }
}

fn init_tracing(verbose: bool, debug: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("debug")
        } else if verbose {
            EnvFilter::new("info")
        } else {
            EnvFilter::new("warn")
        }
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn dispatch(args: MarkrunArgs) -> Result<ExitStatus> {
    let mut config = HarnessConfig::load(args.config.as_deref())?;
    if let Some(color) = args.color {
        config.color = color;
    }

    match args.command {
        Command::Run {
            select,
            allow_empty,
            no_live_output,
            report_json,
        } => {
            if allow_empty {
                config.empty_selection = EmptySelectionPolicy::Pass;
            }
            if no_live_output {
                config.live_output = false;
            }
            if report_json.is_some() {
                config.report_json = report_json;
            }
            run_cases(&config, &select)
        }
        Command::List { select } => list_cases(&config, &select),
        Command::Labels { source } => {
            let registry = build_registry(&config, &source)?;
            print_labels(&registry.labels());
            Ok(ExitStatus::Success)
        }
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

fn run_cases(config: &HarnessConfig, select: &SelectArgs) -> Result<ExitStatus> {
    let registry = build_registry(config, &select.source)?;
    let ids = selected_ids(config, &registry, select)?;
    info!(selected = ids.len(), registered = registry.len(), "selection resolved");

    let mut console = ConsoleSink::new(config.color.color_choice(), config.live_output);
    console.print_header(ids.len(), registry.len());

    let report = Runner::new(&registry).run(&ids, &mut console)?;
    let summary = summarize(&report);
    console.print_summary(&report, &summary);
    info!(passed = summary.passed, failed = summary.failed, "summary");

    if let Some(path) = &config.report_json {
        write_json_report(path, &report)?;
    }

    Ok(ExitStatus::from_summary(&summary))
}

fn list_cases(config: &HarnessConfig, select: &SelectArgs) -> Result<ExitStatus> {
    let registry = build_registry(config, &select.source)?;
    let ids = selected_ids(config, &registry, select)?;
    print_case_list(&registry, &ids);
    Ok(ExitStatus::Success)
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Registers built-in suites (unless disabled) followed by file suites from the
/// configured directories and then the command-line ones.
fn build_registry(config: &HarnessConfig, source: &SourceArgs) -> Result<Registry> {
    let mut all = if config.builtin_suites && !source.no_builtin {
        suites::builtin()?
    } else {
        Vec::new()
    };

    let dirs: Vec<_> = config
        .suite_dirs
        .iter()
        .chain(&source.suite_dirs)
        .cloned()
        .collect();
    all.extend(discovery::load_suites(&dirs)?);

    Registry::from_suites(all)
}

/// Applies the selection flags. Unless empty selections are allowed, a label
/// no case carries and a selection matching nothing are both errors.
fn selected_ids(
    config: &HarnessConfig,
    registry: &Registry,
    select: &SelectArgs,
) -> Result<Vec<CaseId>> {
    let selection = selection(select)?;
    let strict = !config.allows_empty_selection();
    if strict {
        if let Some(expr) = &selection.expr {
            registry.check_labels(expr)?;
        }
    }

    let ids = registry.apply(&selection)?;
    if ids.is_empty() && strict {
        return Err(HarnessError::EmptySelection);
    }
    Ok(ids)
}

fn selection(select: &SelectArgs) -> Result<Selection> {
    let expr = select
        .expr
        .as_deref()
        .map(parse_expression)
        .transpose()?;

    Ok(Selection {
        ids: select.ids.clone(),
        expr,
        keyword: select.keyword.clone(),
    })
}

fn write_json_report(path: &Path, report: &Report) -> Result<()> {
    let json = report
        .to_json()
        .map_err(|e| HarnessError::io(path, std::io::Error::other(e)))?;
    fs::write(path, json).map_err(|e| HarnessError::io(path, e))?;
    info!(path = %path.display(), "wrote JSON report");
    Ok(())
}

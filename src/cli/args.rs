//! Flags for markrun: global options, where suites come from, and how cases
//! are picked (node ids, `-m` label expression, `-k` keyword).

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ColorMode;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "markrun",
    version,
    about = "Run labelled test cases, selected by label expressions."
)]
pub struct MarkrunArgs {
    /// Configuration file (defaults to ./markrun.yaml when present).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// When to colorize output.
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorMode>,

    /// Log selection and run progress to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log everything, including per-case events.
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Where cases come from.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Additional directory scanned for YAML suite files. Repeatable.
    #[arg(long = "suite-dir", value_name = "DIR")]
    pub suite_dirs: Vec<PathBuf>,

    /// Do not register the built-in suites.
    #[arg(long)]
    pub no_builtin: bool,
}

/// Which cases to pick.
#[derive(Debug, Clone, Default, Args)]
pub struct SelectArgs {
    /// Node ids (`Suite::case`) or unambiguous case names, run in the given order.
    pub ids: Vec<String>,

    /// Label expression, e.g. "hdfs_to_azure and not register_task".
    #[arg(short = 'm', long = "labels", value_name = "EXPR")]
    pub expr: Option<String>,

    /// Only cases whose node id contains this text (case-insensitive).
    #[arg(short = 'k', long, value_name = "KEYWORD")]
    pub keyword: Option<String>,

    #[command(flatten)]
    pub source: SourceArgs,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the selected cases and report the outcome.
    Run {
        #[command(flatten)]
        select: SelectArgs,

        /// Succeed when nothing matches instead of exiting with code 5.
        #[arg(long)]
        allow_empty: bool,

        /// Do not echo case output while the cases run.
        #[arg(long)]
        no_live_output: bool,

        /// Also write the report as JSON to this file.
        #[arg(long, value_name = "FILE")]
        report_json: Option<PathBuf>,
    },
    /// List the selected cases without running them.
    List {
        #[command(flatten)]
        select: SelectArgs,
    },
    /// List every registered label with the number of cases carrying it.
    Labels {
        #[command(flatten)]
        source: SourceArgs,
    },
}

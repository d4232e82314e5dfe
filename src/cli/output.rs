//! Handles all user-facing output for the CLI.
//!
//! Case output, PASS/FAIL lines and summaries are written here so every
//! command formats things the same way.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::label::Label;
use crate::registry::{CaseId, Registry};
use crate::report::{CaseReport, Report, Summary};
use crate::runner::OutputSink;

// ============================================================================
// CONSOLE SINK
// ============================================================================

/// Writes a run to stdout as it happens.
pub struct ConsoleSink {
    stdout: StandardStream,
    live_output: bool,
}

impl ConsoleSink {
    pub fn new(choice: ColorChoice, live_output: bool) -> Self {
        Self {
            stdout: StandardStream::stdout(choice),
            live_output,
        }
    }

    pub fn print_header(&mut self, selected: usize, registered: usize) {
        let deselected = registered.saturating_sub(selected);
        self.colored(Color::Cyan, true, "markrun");
        let _ = writeln!(
            self.stdout,
            ": collected {registered} cases / {deselected} deselected / {selected} selected"
        );
    }

    pub fn print_summary(&mut self, report: &Report, summary: &Summary) {
        if summary.has_failures() {
            let _ = writeln!(self.stdout, "\nFailed cases:");
            for case in report.cases().iter().filter(|c| !c.passed()) {
                let _ = write!(self.stdout, "  - {}", case.id);
                match &case.failure {
                    Some(failure) => {
                        let _ = writeln!(self.stdout, ": {failure}");
                    }
                    None => {
                        let _ = writeln!(self.stdout);
                    }
                }
            }
        }

        let _ = write!(self.stdout, "\nSummary: total {}, ", summary.total);
        self.colored(Color::Green, false, &format!("passed {}", summary.passed));
        let _ = write!(self.stdout, ", ");
        let failed_color = if summary.has_failures() {
            Color::Red
        } else {
            Color::White
        };
        self.colored(failed_color, false, &format!("failed {}", summary.failed));
        match summary.success_rate() {
            Some(rate) => {
                let _ = writeln!(self.stdout, " ({rate:.1}% passed)");
            }
            None => {
                let _ = writeln!(self.stdout);
            }
        }
    }

    fn colored(&mut self, color: Color, bold: bool, text: &str) {
        let _ = self
            .stdout
            .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold));
        let _ = write!(self.stdout, "{text}");
        let _ = self.stdout.reset();
    }
}

impl OutputSink for ConsoleSink {
    fn emit(&mut self, _case: &CaseId, text: &str) {
        if self.live_output {
            let _ = writeln!(self.stdout, "{text}");
        }
    }

    fn case_finished(&mut self, report: &CaseReport) {
        if report.passed() {
            self.colored(Color::Green, true, "PASS");
        } else {
            self.colored(Color::Red, true, "FAIL");
        }
        let _ = writeln!(
            self.stdout,
            " {} ({:.1} ms)",
            report.id,
            report.duration.as_secs_f64() * 1000.0
        );

        if let Some(failure) = &report.failure {
            let _ = writeln!(self.stdout, "  {failure}");
            // Captured output was not shown live, so show it next to the failure.
            if !self.live_output && !report.output.is_empty() {
                let _ = writeln!(self.stdout, "  captured output:");
                for line in &report.output {
                    let _ = writeln!(self.stdout, "    {line}");
                }
            }
        }
        let _ = self.stdout.flush();
    }
}

// ============================================================================
// LISTINGS
// ============================================================================

/// Prints selected node ids with their labels.
pub fn print_case_list(registry: &Registry, ids: &[CaseId]) {
    for id in ids {
        match registry.get(id) {
            Some(case) => println!("{id}  [{}]", case.labels),
            None => println!("{id}"),
        }
    }
    println!("\n{} of {} cases selected", ids.len(), registry.len());
}

/// Prints every label with its case count.
pub fn print_labels(labels: &[(&Label, usize)]) {
    if labels.is_empty() {
        println!("  No labels registered.");
        return;
    }

    let width = labels
        .iter()
        .map(|(label, _)| label.as_str().len())
        .max()
        .unwrap_or(0);
    for (label, count) in labels {
        let noun = if *count == 1 { "case" } else { "cases" };
        println!("  {:<width$}  {count} {noun}", label.as_str());
    }
}

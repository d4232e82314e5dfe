//! Run reports, summaries and exit statuses.

use std::fmt;
use std::process::ExitCode;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::errors::{CaseError, HarnessError, Result};
use crate::registry::CaseId;

// ============================================================================
// OUTCOME STATE MACHINE
// ============================================================================

/// Per-case state: `not-run -> running -> {passed, failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    #[default]
    NotRun,
    Running,
    Passed,
    Failed,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::NotRun => "not-run",
            Outcome::Running => "running",
            Outcome::Passed => "passed",
            Outcome::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Outcome::Passed | Outcome::Failed)
    }

    /// Moves to `next`, rejecting every transition the state machine forbids.
    pub fn advance(self, next: Outcome, id: &CaseId) -> Result<Outcome> {
        match (self, next) {
            (Outcome::NotRun, Outcome::Running)
            | (Outcome::Running, Outcome::Passed)
            | (Outcome::Running, Outcome::Failed) => Ok(next),
            _ => Err(HarnessError::InvalidTransition {
                id: id.to_string(),
                from: self.as_str(),
                to: next.as_str(),
            }),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// REPORT
// ============================================================================

/// What one case did during a run.
#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub id: CaseId,
    pub outcome: Outcome,
    /// Diagnostic lines the case emitted, in emission order.
    pub output: Vec<String>,
    pub failure: Option<CaseError>,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }
}

fn serialize_millis<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}

/// Per-run results in the order the cases were requested.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    cases: Vec<CaseReport>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, case: CaseReport) {
        self.cases.push(case);
    }

    pub fn cases(&self) -> &[CaseReport] {
        &self.cases
    }

    pub fn get(&self, id: &CaseId) -> Option<&CaseReport> {
        self.cases.iter().find(|c| &c.id == id)
    }

    pub fn outcome(&self, id: &CaseId) -> Outcome {
        self.get(id).map(|c| c.outcome).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// JSON document with the summary followed by every case.
    pub fn to_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct JsonReport<'a> {
            summary: Summary,
            cases: &'a [CaseReport],
        }

        serde_json::to_string_pretty(&JsonReport {
            summary: summarize(self),
            cases: &self.cases,
        })
    }
}

// ============================================================================
// SUMMARY
// ============================================================================

/// Aggregate counts of a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub failed_ids: Vec<CaseId>,
}

impl Summary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Percentage of passed cases; `None` when nothing ran.
    pub fn success_rate(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some((self.passed as f64 / self.total as f64) * 100.0)
    }
}

/// Counts outcomes. Pure.
pub fn summarize(report: &Report) -> Summary {
    let mut summary = Summary {
        total: report.len(),
        ..Summary::default()
    };
    for case in report.cases() {
        match case.outcome {
            Outcome::Passed => summary.passed += 1,
            Outcome::Failed => {
                summary.failed += 1;
                summary.failed_ids.push(case.id.clone());
            }
            Outcome::NotRun | Outcome::Running => {}
        }
    }
    summary
}

// ============================================================================
// EXIT STATUS
// ============================================================================

/// Process exit codes, numbered like pytest's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    TestsFailed,
    InternalError,
    UsageError,
    NoTestsCollected,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::TestsFailed => 1,
            ExitStatus::InternalError => 3,
            ExitStatus::UsageError => 4,
            ExitStatus::NoTestsCollected => 5,
        }
    }

    pub fn from_summary(summary: &Summary) -> Self {
        if summary.has_failures() {
            ExitStatus::TestsFailed
        } else {
            ExitStatus::Success
        }
    }

    pub fn from_error(error: &HarnessError) -> Self {
        match error {
            HarnessError::EmptySelection => ExitStatus::NoTestsCollected,
            e if e.is_usage_error() => ExitStatus::UsageError,
            _ => ExitStatus::InternalError,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

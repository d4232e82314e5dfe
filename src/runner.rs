//! Sequential case execution.
//!
//! Cases run one at a time in the order requested. Each case gets a fresh
//! [`CaseContext`] with its own capture buffer; what it emits is also forwarded
//! to an [`OutputSink`] immediately, so output is visible while the run is in
//! progress. A failing or panicking case is recorded and the run moves on.

use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tracing::{debug, info};

use crate::errors::{CaseError, CaseResult, HarnessError, Result};
use crate::registry::{CaseId, Registry, TestCase};
use crate::report::{CaseReport, Outcome, Report};

// ============================================================================
// OUTPUT SINKS
// ============================================================================

/// Receives case output and lifecycle notifications while a run is in progress.
pub trait OutputSink {
    /// Called for every diagnostic line a case emits, as it is emitted.
    fn emit(&mut self, case: &CaseId, text: &str);

    fn case_started(&mut self, _case: &CaseId) {}

    fn case_finished(&mut self, _report: &CaseReport) {}
}

/// Discards everything; cases still capture their own output.
#[derive(Debug, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn emit(&mut self, _case: &CaseId, _text: &str) {}
}

/// Collects live output into memory for programmatic inspection.
#[derive(Debug, Default)]
pub struct BufferSink {
    pub lines: Vec<(CaseId, String)>,
    pub finished: Vec<(CaseId, Outcome)>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputSink for BufferSink {
    fn emit(&mut self, case: &CaseId, text: &str) {
        self.lines.push((case.clone(), text.to_string()));
    }

    fn case_finished(&mut self, report: &CaseReport) {
        self.finished.push((report.id.clone(), report.outcome));
    }
}

// ============================================================================
// CASE CONTEXT
// ============================================================================

/// The isolated environment a case body runs in.
pub struct CaseContext<'a> {
    id: &'a CaseId,
    captured: Vec<String>,
    live: &'a mut dyn OutputSink,
}

impl<'a> CaseContext<'a> {
    fn new(id: &'a CaseId, live: &'a mut dyn OutputSink) -> Self {
        Self {
            id,
            captured: Vec::new(),
            live,
        }
    }

    pub fn id(&self) -> &CaseId {
        self.id
    }

    /// Emits one diagnostic line: captured for the report and echoed live.
    pub fn emit(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        self.live.emit(self.id, text);
        self.captured.push(text.to_string());
    }

    /// The terminal boolean check of a case.
    pub fn check(&self, condition: bool, description: impl Into<String>) -> CaseResult {
        if condition {
            Ok(())
        } else {
            Err(CaseError::assertion(description))
        }
    }

    pub fn captured(&self) -> &[String] {
        &self.captured
    }

    fn into_captured(self) -> Vec<String> {
        self.captured
    }
}

// ============================================================================
// RUNNER
// ============================================================================

/// Executes registered cases.
pub struct Runner<'r> {
    registry: &'r Registry,
}

impl<'r> Runner<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Runs `ids` in order and returns a report in the same order.
    ///
    /// Every id is looked up before anything runs: an unknown or repeated id
    /// fails the whole request without executing a single case.
    pub fn run(&self, ids: &[CaseId], sink: &mut dyn OutputSink) -> Result<Report> {
        let cases = self.lookup(ids)?;
        info!(cases = cases.len(), "starting run");

        let mut report = Report::new();
        for case in cases {
            let result = self.run_case(case, sink)?;
            sink.case_finished(&result);
            report.push(result);
        }

        info!(total = report.len(), "run finished");
        Ok(report)
    }

    fn lookup(&self, ids: &[CaseId]) -> Result<Vec<&'r TestCase>> {
        let mut seen = HashSet::with_capacity(ids.len());
        ids.iter()
            .map(|id| {
                if !seen.insert(id) {
                    return Err(HarnessError::DuplicateSelection { id: id.to_string() });
                }
                self.registry
                    .get(id)
                    .ok_or_else(|| HarnessError::UnknownCase { id: id.to_string() })
            })
            .collect()
    }

    fn run_case(&self, case: &TestCase, sink: &mut dyn OutputSink) -> Result<CaseReport> {
        let mut outcome = Outcome::NotRun.advance(Outcome::Running, &case.id)?;
        sink.case_started(&case.id);
        debug!(case = %case.id, "case started");

        let started = Instant::now();
        let mut ctx = CaseContext::new(&case.id, sink);
        let result = match panic::catch_unwind(AssertUnwindSafe(|| (case.body)(&mut ctx))) {
            Ok(result) => result,
            Err(payload) => Err(CaseError::fault(panic_message(payload.as_ref()))),
        };
        let duration = started.elapsed();
        let output = ctx.into_captured();

        let next = if result.is_ok() {
            Outcome::Passed
        } else {
            Outcome::Failed
        };
        outcome = outcome.advance(next, &case.id)?;
        debug!(case = %case.id, %outcome, ?duration, "case finished");

        Ok(CaseReport {
            id: case.id.clone(),
            outcome,
            output,
            failure: result.err(),
            duration,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked with a non-string payload".to_string()
    }
}

//! markrun: a label-driven test case registry and runner.
//!
//! Cases are registered with a set of labels, selected with boolean label
//! expressions, and run one after another with per-case isolation.
//!
//! ```rust
//! use markrun::{parse_expression, summarize, NullSink, Registry, Runner};
//!
//! let registry = Registry::from_suites(markrun::suites::builtin()?)?;
//! let ids = registry.select(&parse_expression("register_schema")?);
//! let report = Runner::new(&registry).run(&ids, &mut NullSink)?;
//! assert_eq!(summarize(&report).passed, 1);
//! # Ok::<(), markrun::HarnessError>(())
//! ```

pub use crate::config::{ColorMode, EmptySelectionPolicy, HarnessConfig};
pub use crate::errors::{CaseError, CaseResult, HarnessError, Result};
pub use crate::label::{Label, LabelSet};
pub use crate::registry::{CaseBody, CaseId, Registry, Selection, Suite, TestCase};
pub use crate::report::{summarize, CaseReport, ExitStatus, Outcome, Report, Summary};
pub use crate::runner::{BufferSink, CaseContext, NullSink, OutputSink, Runner};
pub use crate::select::{parse_expression, LabelExpr};

pub mod cli;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod label;
pub mod registry;
pub mod report;
pub mod runner;
pub mod select;
pub mod suites;

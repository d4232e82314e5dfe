//! markrun error handling.
//!
//! Two layers: [`CaseError`] is local to a single case and always ends up as a
//! `failed` outcome in the report; [`HarnessError`] aborts the operation that
//! produced it (registration, selection parsing, lookup, configuration).

use std::path::PathBuf;
use std::sync::Arc;

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::Serialize;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = HarnessError> = std::result::Result<T, E>;

/// Result of a single case body.
pub type CaseResult = std::result::Result<(), CaseError>;

// ============================================================================
// CASE-LOCAL ERRORS
// ============================================================================

/// Why a case failed. Never propagates past the runner.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaseError {
    /// The terminal boolean check evaluated false.
    #[error("assertion failed: {message}")]
    Assertion { message: String },

    /// The body failed outside the check path (explicit fault or panic).
    #[error("unhandled fault: {message}")]
    Fault { message: String },
}

impl CaseError {
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
        }
    }

    pub fn fault(message: impl Into<String>) -> Self {
        Self::Fault {
            message: message.into(),
        }
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self, Self::Assertion { .. })
    }
}

// ============================================================================
// HARNESS ERRORS
// ============================================================================

/// Errors raised by the registry, selector, runner setup and CLI plumbing.
#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("case '{id}' is not registered")]
    #[diagnostic(
        code(markrun::lookup::unknown_case),
        help("use `markrun list` to see the registered node ids")
    )]
    UnknownCase { id: String },

    #[error("case name '{name}' is ambiguous")]
    #[diagnostic(code(markrun::lookup::ambiguous_case))]
    AmbiguousCase {
        name: String,
        candidates: Vec<String>,
        #[help]
        help: String,
    },

    #[error("case '{id}' was requested more than once in the same run")]
    #[diagnostic(code(markrun::lookup::duplicate_selection))]
    DuplicateSelection { id: String },

    #[error("no cases matched the selection")]
    #[diagnostic(
        code(markrun::lookup::empty_selection),
        help("pass --allow-empty or set `empty_selection: pass` to treat this as success")
    )]
    EmptySelection,

    #[error("invalid label expression: {message}")]
    #[diagnostic(code(markrun::select::invalid_expression))]
    InvalidExpression {
        message: String,
        #[source_code]
        src: Arc<NamedSource<String>>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("invalid label '{label}'")]
    #[diagnostic(
        code(markrun::registry::invalid_label),
        help("labels use [A-Za-z0-9_.:-] and cannot be `and`, `or` or `not`")
    )]
    InvalidLabel { label: String },

    #[error("invalid suite or case name '{name}'")]
    #[diagnostic(
        code(markrun::registry::invalid_name),
        help("names must be non-empty, contain no whitespace and no `::`")
    )]
    InvalidName { name: String },

    #[error("case '{id}' must carry at least one label")]
    #[diagnostic(code(markrun::registry::empty_labels))]
    EmptyLabels { id: String },

    #[error("label '{label}' is attached more than once")]
    #[diagnostic(code(markrun::registry::duplicate_label))]
    DuplicateLabel { label: String },

    #[error("case '{id}' is already registered")]
    #[diagnostic(code(markrun::registry::duplicate_case))]
    DuplicateCase { id: String },

    #[error("suite '{name}' is already registered")]
    #[diagnostic(
        code(markrun::registry::duplicate_suite),
        help("every suite needs a unique name; check suite files declaring the same `suite:`")
    )]
    DuplicateSuite { name: String },

    #[error("case '{id}' belongs to suite '{suite}' but does not carry its label '{label}'")]
    #[diagnostic(code(markrun::registry::missing_suite_label))]
    MissingSuiteLabel {
        id: String,
        suite: String,
        label: String,
    },

    #[error("label '{label}' is not attached to any registered case")]
    #[diagnostic(
        code(markrun::lookup::unknown_label),
        help("use `markrun labels` to see the known labels, or pass --allow-empty to only warn")
    )]
    UnknownLabel { label: String },

    #[error("case '{id}' cannot move from {from} to {to}")]
    #[diagnostic(code(markrun::runner::invalid_transition))]
    InvalidTransition {
        id: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("invalid configuration in {}: {message}", .path.display())]
    #[diagnostic(code(markrun::config))]
    Config { path: PathBuf, message: String },

    #[error("invalid suite file {}: {message}", .path.display())]
    #[diagnostic(code(markrun::discovery::suite_file))]
    SuiteFile { path: PathBuf, message: String },

    #[error("I/O error on {}: {source}", .path.display())]
    #[diagnostic(code(markrun::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HarnessError {
    pub fn ambiguous(name: impl Into<String>, candidates: Vec<String>) -> Self {
        let help = format!("qualify it with its suite, one of: {}", candidates.join(", "));
        Self::AmbiguousCase {
            name: name.into(),
            candidates,
            help,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the errors a user causes with their invocation, as opposed to
    /// failures of the harness itself.
    pub fn is_usage_error(&self) -> bool {
        !matches!(
            self,
            Self::Io { .. } | Self::InvalidTransition { .. } | Self::EmptySelection
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_error_display_names_the_kind() {
        assert_eq!(
            CaseError::assertion("1 == 2").to_string(),
            "assertion failed: 1 == 2"
        );
        assert_eq!(
            CaseError::fault("boom").to_string(),
            "unhandled fault: boom"
        );
        assert!(CaseError::assertion("x").is_assertion());
        assert!(!CaseError::fault("x").is_assertion());
    }

    #[test]
    fn lookup_errors_are_usage_errors() {
        assert!(HarnessError::UnknownCase { id: "a".into() }.is_usage_error());
        assert!(HarnessError::UnknownLabel { label: "typo".into() }.is_usage_error());
        assert!(!HarnessError::EmptySelection.is_usage_error());
        let io = HarnessError::io("x", std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(!io.is_usage_error());
    }
}

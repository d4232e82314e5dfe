//! Declarative suite files.
//!
//! A suite can be described in YAML instead of code. Each case emits its lines
//! and then evaluates its fixed check:
//!
//! ```yaml
//! suite: TestHDFSToAzure
//! label: P1
//! cases:
//!   - name: test_register_schema_sql
//!     labels: [hdfs_to_azure, register_schema]
//!     emit:
//!       - "Running HDFS to Azure - register_schema"
//!     check: true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::errors::{HarnessError, Result};
use crate::label::LabelSet;
use crate::registry::Suite;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SuiteFile {
    suite: String,
    label: String,
    #[serde(default)]
    cases: Vec<CaseSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CaseSpec {
    name: String,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    emit: Vec<String>,
    check: bool,
    /// Shown when the check is false.
    #[serde(default)]
    message: Option<String>,
}

/// Returns true if the path has a .yaml or .yml extension.
fn is_suite_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "yaml" || ext == "yml")
}

/// Recursively finds suite files under `root`, sorted for a stable order.
pub fn discover_suite_files<P: AsRef<Path>>(root: P) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| HarnessError::SuiteFile {
            path: root.to_path_buf(),
            message: format!("failed to walk directory: {e}"),
        })?;
        if entry.file_type().is_file() && is_suite_file(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Loads one suite file.
pub fn load_suite_file(path: &Path) -> Result<Suite> {
    let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
    parse_suite(&text, path)
}

/// Parses suite YAML; `origin` is only used in error messages.
pub fn parse_suite(text: &str, origin: &Path) -> Result<Suite> {
    let file: SuiteFile = serde_yaml::from_str(text).map_err(|e| HarnessError::SuiteFile {
        path: origin.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut suite = Suite::new(file.suite, &file.label)?;
    for spec in file.cases {
        let labels = LabelSet::parse(&spec.labels)?;
        let CaseSpec {
            name,
            emit,
            check,
            message,
            ..
        } = spec;
        let message = message.unwrap_or_else(|| format!("{name}: check is false"));
        suite.add_case(&name, labels, move |ctx| {
            for line in &emit {
                ctx.emit(line);
            }
            ctx.check(check, message.clone())
        })?;
    }
    debug!(path = %origin.display(), suite = suite.name(), cases = suite.cases().len(), "loaded suite file");
    Ok(suite)
}

/// Loads every suite file under each directory, directories in the given order.
pub fn load_suites(dirs: &[PathBuf]) -> Result<Vec<Suite>> {
    let mut suites = Vec::new();
    for dir in dirs {
        if !dir.is_dir() {
            return Err(HarnessError::SuiteFile {
                path: dir.clone(),
                message: "not a directory".to_string(),
            });
        }
        for file in discover_suite_files(dir)? {
            suites.push(load_suite_file(&file)?);
        }
    }
    Ok(suites)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUITE: &str = r#"
suite: Smoke
label: P2
cases:
  - name: first
    labels: [quick]
    emit: ["hello", "world"]
    check: true
  - name: second
    check: false
    message: "expected to fail"
"#;

    #[test]
    fn parses_cases_with_suite_label() {
        let suite = parse_suite(SUITE, Path::new("smoke.yaml")).unwrap();
        assert_eq!(suite.name(), "Smoke");
        assert_eq!(suite.cases().len(), 2);
        assert!(suite.cases()[0].labels.contains("P2"));
        assert!(suite.cases()[0].labels.contains("quick"));
        assert_eq!(suite.cases()[1].labels.len(), 1);
    }

    #[test]
    fn missing_check_is_a_suite_file_error() {
        let yaml = "suite: S\nlabel: P1\ncases:\n  - name: a\n";
        let err = parse_suite(yaml, Path::new("s.yaml")).unwrap_err();
        assert!(matches!(err, HarnessError::SuiteFile { .. }));
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let yaml = "suite: S\nlabel: P1\ncases:\n  - name: a\n    labels: [x, x]\n    check: true\n";
        let err = parse_suite(yaml, Path::new("s.yaml")).unwrap_err();
        assert!(matches!(err, HarnessError::DuplicateLabel { .. }));
    }

    #[test]
    fn only_yaml_files_are_suite_files() {
        assert!(is_suite_file(Path::new("a/b.yaml")));
        assert!(is_suite_file(Path::new("b.yml")));
        assert!(!is_suite_file(Path::new("b.json")));
        assert!(!is_suite_file(Path::new("yaml")));
    }
}

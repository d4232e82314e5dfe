//! Case registry: suites, cases, and the label index used for selection.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::errors::{CaseResult, HarnessError, Result};
use crate::label::{Label, LabelSet};
use crate::runner::CaseContext;
use crate::select::LabelExpr;

/// Separator between suite and case name in a node id.
pub const ID_SEPARATOR: &str = "::";

// ============================================================================
// CORE TYPES
// ============================================================================

/// Fully qualified case identifier, displayed as `Suite::case`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaseId {
    suite: String,
    name: String,
}

impl CaseId {
    pub fn new(suite: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let suite = validate_name(suite.into())?;
        let name = validate_name(name.into())?;
        Ok(Self { suite, name })
    }

    /// Splits `Suite::case`; returns `None` for a bare name.
    pub fn parse(text: &str) -> Option<Result<Self>> {
        text.split_once(ID_SEPARATOR)
            .map(|(suite, name)| Self::new(suite, name))
    }

    pub fn suite(&self) -> &str {
        &self.suite
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.suite, ID_SEPARATOR, self.name)
    }
}

impl Serialize for CaseId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn validate_name(name: String) -> Result<String> {
    if name.is_empty() || name.contains(ID_SEPARATOR) || name.chars().any(char::is_whitespace) {
        return Err(HarnessError::InvalidName { name });
    }
    Ok(name)
}

/// The executable part of a case: emit diagnostics, then evaluate one check.
pub type CaseBody = Box<dyn Fn(&mut CaseContext<'_>) -> CaseResult>;

/// One registered unit of verification.
pub struct TestCase {
    pub id: CaseId,
    pub labels: LabelSet,
    pub body: CaseBody,
}

impl TestCase {
    pub fn new<F>(id: CaseId, labels: LabelSet, body: F) -> Result<Self>
    where
        F: Fn(&mut CaseContext<'_>) -> CaseResult + 'static,
    {
        if labels.is_empty() {
            return Err(HarnessError::EmptyLabels { id: id.to_string() });
        }
        Ok(Self {
            id,
            labels,
            body: Box::new(body),
        })
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("id", &self.id)
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SUITE
// ============================================================================

/// An ordered group of cases sharing a grouping label.
///
/// Every case added through [`Suite::add_case`] carries the grouping label in
/// addition to its own labels.
#[derive(Debug)]
pub struct Suite {
    name: String,
    label: Label,
    cases: Vec<TestCase>,
}

impl Suite {
    pub fn new(name: impl Into<String>, label: &str) -> Result<Self> {
        Ok(Self {
            name: validate_name(name.into())?,
            label: Label::new(label)?,
            cases: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    /// Adds a case with its own labels; the grouping label is added here.
    pub fn add_case<F>(&mut self, name: &str, labels: LabelSet, body: F) -> Result<()>
    where
        F: Fn(&mut CaseContext<'_>) -> CaseResult + 'static,
    {
        let id = CaseId::new(self.name.as_str(), name)?;
        if self.cases.iter().any(|c| c.id == id) {
            return Err(HarnessError::DuplicateCase { id: id.to_string() });
        }
        let mut labels = labels;
        labels.insert(self.label.clone())?;
        self.cases.push(TestCase::new(id, labels, body)?);
        Ok(())
    }

    /// Builder form of [`Suite::add_case`] taking raw label strings.
    pub fn case<F>(mut self, name: &str, labels: &[&str], body: F) -> Result<Self>
    where
        F: Fn(&mut CaseContext<'_>) -> CaseResult + 'static,
    {
        self.add_case(name, LabelSet::parse(labels.iter().copied())?, body)?;
        Ok(self)
    }
}

// ============================================================================
// SELECTION REQUEST
// ============================================================================

/// What the caller asked to run: explicit ids, a label expression and a
/// keyword, all optional. Filters apply in that order.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub ids: Vec<String>,
    pub expr: Option<LabelExpr>,
    pub keyword: Option<String>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_expr(expr: LabelExpr) -> Self {
        Self {
            expr: Some(expr),
            ..Self::default()
        }
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Every registered case, in registration order, plus a label index.
#[derive(Debug, Default)]
pub struct Registry {
    cases: Vec<TestCase>,
    by_id: HashMap<CaseId, usize>,
    index: BTreeMap<Label, Vec<usize>>,
    /// Grouping label of every suite registered through [`Registry::add_suite`].
    suites: HashMap<String, Label>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from suites, registering them in the given order.
    pub fn from_suites<I: IntoIterator<Item = Suite>>(suites: I) -> Result<Self> {
        let mut registry = Self::new();
        for suite in suites {
            registry.add_suite(suite)?;
        }
        Ok(registry)
    }

    /// Registers a case body under `id` with the given labels.
    ///
    /// A case joining an already registered suite must carry that suite's
    /// grouping label.
    pub fn register<F>(&mut self, id: CaseId, labels: LabelSet, body: F) -> Result<()>
    where
        F: Fn(&mut CaseContext<'_>) -> CaseResult + 'static,
    {
        if let Some(label) = self.suites.get(id.suite()) {
            if !labels.contains(label.as_str()) {
                return Err(HarnessError::MissingSuiteLabel {
                    id: id.to_string(),
                    suite: id.suite().to_string(),
                    label: label.to_string(),
                });
            }
        }
        self.insert(TestCase::new(id, labels, body)?)
    }

    /// Registers every case of a suite. Suite names are unique per registry.
    pub fn add_suite(&mut self, suite: Suite) -> Result<()> {
        let taken = self.suites.contains_key(&suite.name)
            || self.by_id.keys().any(|id| id.suite() == suite.name);
        if taken {
            return Err(HarnessError::DuplicateSuite { name: suite.name });
        }

        debug!(suite = %suite.name, cases = suite.cases.len(), "registering suite");
        for case in suite.cases {
            self.insert(case)?;
        }
        self.suites.insert(suite.name, suite.label);
        Ok(())
    }

    fn insert(&mut self, case: TestCase) -> Result<()> {
        if self.by_id.contains_key(&case.id) {
            return Err(HarnessError::DuplicateCase {
                id: case.id.to_string(),
            });
        }
        let position = self.cases.len();
        for label in case.labels.iter() {
            self.index.entry(label.clone()).or_default().push(position);
        }
        self.by_id.insert(case.id.clone(), position);
        self.cases.push(case);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn cases(&self) -> impl Iterator<Item = &TestCase> {
        self.cases.iter()
    }

    pub fn get(&self, id: &CaseId) -> Option<&TestCase> {
        self.by_id.get(id).map(|&i| &self.cases[i])
    }

    /// Every indexed label with the number of cases carrying it.
    pub fn labels(&self) -> Vec<(&Label, usize)> {
        self.index
            .iter()
            .map(|(label, cases)| (label, cases.len()))
            .collect()
    }

    pub fn has_label(&self, label: &Label) -> bool {
        self.index.contains_key(label)
    }

    /// Fails on the first label in `expr` that no registered case carries.
    pub fn check_labels(&self, expr: &LabelExpr) -> Result<()> {
        match expr.referenced_labels().into_iter().find(|l| !self.has_label(l)) {
            Some(label) => Err(HarnessError::UnknownLabel {
                label: label.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Ids of every case matching `expr`, in registration order.
    pub fn select(&self, expr: &LabelExpr) -> Vec<CaseId> {
        for label in expr.referenced_labels() {
            if !self.has_label(label) {
                warn!(%label, "label is not attached to any registered case");
            }
        }

        if let Some(label) = expr.as_single_label() {
            return self
                .index
                .get(label)
                .map(|positions| positions.iter().map(|&i| self.cases[i].id.clone()).collect())
                .unwrap_or_default();
        }

        self.cases
            .iter()
            .filter(|case| expr.matches(&case.labels))
            .map(|case| case.id.clone())
            .collect()
    }

    /// Looks up a full node id, or a bare case name when it is unambiguous.
    pub fn resolve(&self, text: &str) -> Result<CaseId> {
        if let Some(parsed) = CaseId::parse(text) {
            let id = parsed.map_err(|_| HarnessError::UnknownCase { id: text.to_string() })?;
            if self.by_id.contains_key(&id) {
                return Ok(id);
            }
            return Err(HarnessError::UnknownCase { id: text.to_string() });
        }

        let mut found = self.cases.iter().filter(|c| c.id.name() == text);
        match (found.next(), found.next()) {
            (None, _) => Err(HarnessError::UnknownCase { id: text.to_string() }),
            (Some(case), None) => Ok(case.id.clone()),
            (Some(first), Some(second)) => {
                let mut candidates = vec![first.id.to_string(), second.id.to_string()];
                candidates.extend(found.map(|c| c.id.to_string()));
                Err(HarnessError::ambiguous(text, candidates))
            }
        }
    }

    /// Applies a [`Selection`]: resolves explicit ids (input order) or takes every
    /// case (registration order), then filters by label expression and keyword.
    pub fn apply(&self, selection: &Selection) -> Result<Vec<CaseId>> {
        let candidates: Vec<CaseId> = if selection.ids.is_empty() {
            match &selection.expr {
                Some(expr) => self.select(expr),
                None => self.cases.iter().map(|c| c.id.clone()).collect(),
            }
        } else {
            let mut resolved = Vec::with_capacity(selection.ids.len());
            for text in &selection.ids {
                let id = self.resolve(text)?;
                if resolved.contains(&id) {
                    return Err(HarnessError::DuplicateSelection { id: id.to_string() });
                }
                resolved.push(id);
            }
            match &selection.expr {
                Some(expr) => {
                    let matching = self.select(expr);
                    resolved.retain(|id| matching.contains(id));
                    resolved
                }
                None => resolved,
            }
        };

        let keyword = selection.keyword.as_deref().map(str::to_lowercase);
        Ok(candidates
            .into_iter()
            .filter(|id| match &keyword {
                Some(k) => id.to_string().to_lowercase().contains(k.as_str()),
                None => true,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass(ctx: &mut CaseContext<'_>) -> CaseResult {
        ctx.check(true, "always")
    }

    fn sample() -> Registry {
        let alpha = Suite::new("Alpha", "P1")
            .unwrap()
            .case("one", &["fast"], pass)
            .unwrap()
            .case("two", &["slow"], pass)
            .unwrap();
        let beta = Suite::new("Beta", "P2")
            .unwrap()
            .case("one", &["fast"], pass)
            .unwrap();
        Registry::from_suites([alpha, beta]).unwrap()
    }

    fn ids(list: &[CaseId]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn suite_label_is_added_to_every_case() {
        let registry = sample();
        for case in registry.cases() {
            assert!(case.labels.len() >= 2);
        }
        assert!(registry
            .get(&CaseId::new("Alpha", "two").unwrap())
            .unwrap()
            .labels
            .contains("P1"));
    }

    #[test]
    fn label_index_counts_cases() {
        let registry = sample();
        let counts: Vec<(String, usize)> = registry
            .labels()
            .into_iter()
            .map(|(l, n)| (l.to_string(), n))
            .collect();
        assert_eq!(
            counts,
            [
                ("P1".to_string(), 2),
                ("P2".to_string(), 1),
                ("fast".to_string(), 2),
                ("slow".to_string(), 1),
            ]
        );
    }

    #[test]
    fn register_rejects_empty_labels_and_duplicates() {
        let mut registry = Registry::new();
        let id = CaseId::new("S", "a").unwrap();
        let err = registry.register(id.clone(), LabelSet::new(), pass).unwrap_err();
        assert!(matches!(err, HarnessError::EmptyLabels { .. }));

        registry
            .register(id.clone(), LabelSet::parse(["x"]).unwrap(), pass)
            .unwrap();
        let err = registry
            .register(id, LabelSet::parse(["y"]).unwrap(), pass)
            .unwrap_err();
        assert!(matches!(err, HarnessError::DuplicateCase { .. }));
    }

    #[test]
    fn suite_names_are_unique() {
        let first = Suite::new("S", "P1").unwrap().case("a", &["x"], pass).unwrap();
        let second = Suite::new("S", "P2").unwrap().case("b", &["y"], pass).unwrap();
        let err = Registry::from_suites([first, second]).unwrap_err();
        assert!(matches!(err, HarnessError::DuplicateSuite { name } if name == "S"));
    }

    #[test]
    fn loose_cases_keep_the_suite_label_invariant() {
        let mut registry = sample();
        let err = registry
            .register(
                CaseId::new("Alpha", "three").unwrap(),
                LabelSet::parse(["fast"]).unwrap(),
                pass,
            )
            .unwrap_err();
        assert!(matches!(err, HarnessError::MissingSuiteLabel { .. }));
        registry
            .register(
                CaseId::new("Alpha", "three").unwrap(),
                LabelSet::parse(["P1", "fast"]).unwrap(),
                pass,
            )
            .unwrap();

        let mut registry = Registry::new();
        registry
            .register(CaseId::new("S", "a").unwrap(), LabelSet::parse(["x"]).unwrap(), pass)
            .unwrap();
        let suite = Suite::new("S", "P1").unwrap().case("b", &["y"], pass).unwrap();
        assert!(matches!(
            registry.add_suite(suite),
            Err(HarnessError::DuplicateSuite { .. })
        ));
    }

    #[test]
    fn check_labels_names_the_unknown_one() {
        let registry = sample();
        registry.check_labels(&"fast and not P2".parse().unwrap()).unwrap();
        let err = registry
            .check_labels(&"fast or typo_label".parse().unwrap())
            .unwrap_err();
        assert!(matches!(err, HarnessError::UnknownLabel { label } if label == "typo_label"));
    }

    #[test]
    fn suite_rejects_repeating_its_own_label() {
        let err = Suite::new("S", "P1")
            .unwrap()
            .case("a", &["P1"], pass)
            .unwrap_err();
        assert!(matches!(err, HarnessError::DuplicateLabel { .. }));
    }

    #[test]
    fn names_cannot_contain_the_separator() {
        assert!(matches!(
            CaseId::new("A::B", "c"),
            Err(HarnessError::InvalidName { .. })
        ));
        assert!(matches!(Suite::new("", "P1"), Err(HarnessError::InvalidName { .. })));
    }

    #[test]
    fn select_keeps_registration_order() {
        let registry = sample();
        let expr = LabelExpr::label("fast").unwrap();
        assert_eq!(ids(&registry.select(&expr)), ["Alpha::one", "Beta::one"]);
        let expr: LabelExpr = "P1 or P2".parse().unwrap();
        assert_eq!(
            ids(&registry.select(&expr)),
            ["Alpha::one", "Alpha::two", "Beta::one"]
        );
        assert!(registry.select(&LabelExpr::label("missing").unwrap()).is_empty());
    }

    #[test]
    fn resolve_accepts_unambiguous_bare_names() {
        let registry = sample();
        assert_eq!(registry.resolve("two").unwrap().to_string(), "Alpha::two");
        assert_eq!(registry.resolve("Beta::one").unwrap().to_string(), "Beta::one");
        assert!(matches!(
            registry.resolve("one"),
            Err(HarnessError::AmbiguousCase { candidates, .. }) if candidates.len() == 2
        ));
        assert!(matches!(
            registry.resolve("Gamma::one"),
            Err(HarnessError::UnknownCase { .. })
        ));
    }

    #[test]
    fn apply_combines_ids_expression_and_keyword() {
        let registry = sample();
        let selection = Selection {
            ids: vec!["Beta::one".into(), "two".into()],
            expr: None,
            keyword: None,
        };
        assert_eq!(ids(&registry.apply(&selection).unwrap()), ["Beta::one", "Alpha::two"]);

        let selection = Selection {
            ids: vec![],
            expr: Some("fast".parse().unwrap()),
            keyword: Some("ALPHA".into()),
        };
        assert_eq!(ids(&registry.apply(&selection).unwrap()), ["Alpha::one"]);

        let selection = Selection {
            ids: vec!["two".into(), "Alpha::two".into()],
            ..Selection::default()
        };
        assert!(matches!(
            registry.apply(&selection),
            Err(HarnessError::DuplicateSelection { .. })
        ));
    }
}

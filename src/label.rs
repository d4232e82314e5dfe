//! Classification labels attached to test cases.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{HarnessError, Result};

/// Words reserved by the label expression grammar.
pub const RESERVED_WORDS: [&str; 3] = ["and", "or", "not"];

/// A single validated label, e.g. `hdfs_to_azure` or `P1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label(String);

impl Label {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if !Self::is_valid(&text) {
            return Err(HarnessError::InvalidLabel { label: text });
        }
        Ok(Self(text))
    }

    /// Returns true if `c` may appear in a label.
    pub fn is_label_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
    }

    fn is_valid(text: &str) -> bool {
        !text.is_empty()
            && text.chars().all(Self::is_label_char)
            && !RESERVED_WORDS.contains(&text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Label {
    type Error = HarnessError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Label {
    type Error = HarnessError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.0
    }
}

impl AsRef<str> for Label {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The set of labels carried by one case.
///
/// Order is irrelevant; iteration is sorted so output stays deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelSet(BTreeSet<Label>);

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from raw strings, rejecting invalid or repeated labels.
    pub fn parse<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for raw in labels {
            set.insert(Label::new(raw.as_ref())?)?;
        }
        Ok(set)
    }

    /// Adds a label. Fails with [`HarnessError::DuplicateLabel`] if already present.
    pub fn insert(&mut self, label: Label) -> Result<()> {
        if self.0.contains(&label) {
            return Err(HarnessError::DuplicateLabel {
                label: label.into(),
            });
        }
        self.0.insert(label);
        Ok(())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|l| l.as_str() == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.0.iter().map(Label::as_str).collect();
        write!(f, "{}", joined.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        for text in ["P1", "hdfs_to_azure", "slow-io", "area.sql", "team:data", "nothing"] {
            assert!(Label::new(text).is_ok(), "{text} should be a valid label");
        }
    }

    #[test]
    fn rejects_reserved_words_and_bad_characters() {
        for text in ["", "and", "or", "not", "has space", "a|b", "(x)"] {
            assert!(
                matches!(Label::new(text), Err(HarnessError::InvalidLabel { .. })),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn label_set_rejects_duplicates() {
        let err = LabelSet::parse(["P1", "hdfs_to_azure", "P1"]).unwrap_err();
        assert!(matches!(err, HarnessError::DuplicateLabel { label } if label == "P1"));
    }

    #[test]
    fn label_set_order_is_irrelevant() {
        let a = LabelSet::parse(["b", "a"]).unwrap();
        let b = LabelSet::parse(["a", "b"]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "a, b");
        assert!(a.contains("a"));
        assert!(!a.contains("c"));
    }
}

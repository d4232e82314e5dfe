//! Boolean label expressions used to select cases.
//!
//! An expression is either a single label or a combination built with `and`,
//! `or`, `not` and parentheses. Precedence is `not` > `and` > `or`.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::errors::{HarnessError, Result};
use crate::label::{Label, LabelSet};

mod parser;

pub use parser::parse_expression;

/// A parsed label expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelExpr {
    /// Matches cases carrying this label.
    Label(Label),
    Not(Box<LabelExpr>),
    /// Matches when every operand matches. Always holds two or more operands.
    And(Vec<LabelExpr>),
    /// Matches when any operand matches. Always holds two or more operands.
    Or(Vec<LabelExpr>),
}

impl LabelExpr {
    /// Expression matching a single label.
    pub fn label(text: impl Into<String>) -> Result<Self> {
        Ok(Self::Label(Label::new(text)?))
    }

    /// Conjunction of every given label, e.g. the suite label plus a case label.
    pub fn all_of<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let operands = labels
            .into_iter()
            .map(Self::label)
            .collect::<Result<Vec<_>>>()?;
        Self::combine(operands, Self::And)
            .ok_or_else(|| parser::invalid_expression("", "expression is empty", 0, 0))
    }

    pub fn and(self, other: LabelExpr) -> Self {
        Self::And(vec![self, other])
    }

    pub fn or(self, other: LabelExpr) -> Self {
        Self::Or(vec![self, other])
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Collapses a list of operands: one operand stays as is, several are wrapped.
    pub(crate) fn combine(
        mut operands: Vec<LabelExpr>,
        wrap: fn(Vec<LabelExpr>) -> LabelExpr,
    ) -> Option<LabelExpr> {
        match operands.len() {
            0 => None,
            1 => operands.pop(),
            _ => Some(wrap(operands)),
        }
    }

    /// Evaluates the expression against the labels of one case.
    pub fn matches(&self, labels: &LabelSet) -> bool {
        match self {
            Self::Label(label) => labels.contains(label.as_str()),
            Self::Not(inner) => !inner.matches(labels),
            Self::And(operands) => operands.iter().all(|e| e.matches(labels)),
            Self::Or(operands) => operands.iter().any(|e| e.matches(labels)),
        }
    }

    /// Every label the expression mentions.
    pub fn referenced_labels(&self) -> BTreeSet<&Label> {
        let mut out = BTreeSet::new();
        self.collect_labels(&mut out);
        out
    }

    fn collect_labels<'a>(&'a self, out: &mut BTreeSet<&'a Label>) {
        match self {
            Self::Label(label) => {
                out.insert(label);
            }
            Self::Not(inner) => inner.collect_labels(out),
            Self::And(operands) | Self::Or(operands) => {
                for operand in operands {
                    operand.collect_labels(out);
                }
            }
        }
    }

    /// The single label this expression consists of, if it is that simple.
    pub fn as_single_label(&self) -> Option<&Label> {
        match self {
            Self::Label(label) => Some(label),
            _ => None,
        }
    }
}

impl FromStr for LabelExpr {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        parse_expression(s)
    }
}

impl fmt::Display for LabelExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label(label) => write!(f, "{label}"),
            Self::Not(inner) => match inner.as_ref() {
                Self::Label(_) | Self::Not(_) => write!(f, "not {inner}"),
                _ => write!(f, "not ({inner})"),
            },
            Self::And(operands) => write_joined(f, operands, " and ", |e| {
                matches!(e, Self::Or(_))
            }),
            Self::Or(operands) => write_joined(f, operands, " or ", |_| false),
        }
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    operands: &[LabelExpr],
    sep: &str,
    needs_parens: fn(&LabelExpr) -> bool,
) -> fmt::Result {
    for (i, operand) in operands.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        if needs_parens(operand) {
            write!(f, "({operand})")?;
        } else {
            write!(f, "{operand}")?;
        }
    }
    Ok(())
}

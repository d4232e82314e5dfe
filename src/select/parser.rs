//! Label expression parser built on the pest grammar in `grammar.pest`.

use std::sync::Arc;

use miette::NamedSource;
use pest::{error::InputLocation, iterators::Pair, Parser};
use pest_derive::Parser;

use super::LabelExpr;
use crate::errors::{HarnessError, Result};
use crate::label::Label;

#[derive(Parser)]
#[grammar = "select/grammar.pest"]
struct ExpressionParser;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parses a label expression such as `P1 and not register_task`.
pub fn parse_expression(text: &str) -> Result<LabelExpr> {
    if text.trim().is_empty() {
        return Err(invalid_expression(text, "expression is empty", 0, text.len()));
    }

    let mut pairs = ExpressionParser::parse(Rule::expression, text)
        .map_err(|e| convert_parse_error(e, text))?;

    let Some(expression) = pairs.next() else {
        return Err(invalid_expression(text, "expression is empty", 0, text.len()));
    };

    // expression = { SOI ~ or_expr ~ EOI }
    let or_expr = expression
        .into_inner()
        .find(|p| p.as_rule() == Rule::or_expr)
        .ok_or_else(|| invalid_expression(text, "missing expression body", 0, text.len()))?;

    build(or_expr, text)
}

pub(crate) fn invalid_expression(
    text: &str,
    message: &str,
    start: usize,
    len: usize,
) -> HarnessError {
    HarnessError::InvalidExpression {
        message: message.to_string(),
        src: Arc::new(NamedSource::new("label expression", text.to_string())),
        span: (start, len).into(),
    }
}

// ============================================================================
// TREE BUILDERS
// ============================================================================

fn build(pair: Pair<Rule>, text: &str) -> Result<LabelExpr> {
    let span = pair.as_span();
    match pair.as_rule() {
        Rule::or_expr => build_operands(pair, text, LabelExpr::Or),
        Rule::and_expr => build_operands(pair, text, LabelExpr::And),
        Rule::not_expr => {
            let mut negations = 0usize;
            let mut operand = None;
            for inner in pair.into_inner() {
                match inner.as_rule() {
                    Rule::not_op => negations += 1,
                    _ => operand = Some(build(inner, text)?),
                }
            }
            let mut expr = operand.ok_or_else(|| {
                invalid_expression(text, "expected a label", span.start(), span.end() - span.start())
            })?;
            for _ in 0..negations {
                expr = expr.not();
            }
            Ok(expr)
        }
        Rule::label => Ok(LabelExpr::Label(Label::new(pair.as_str())?)),
        _ => Err(invalid_expression(
            text,
            "unexpected token",
            span.start(),
            span.end() - span.start(),
        )),
    }
}

fn build_operands(
    pair: Pair<Rule>,
    text: &str,
    wrap: fn(Vec<LabelExpr>) -> LabelExpr,
) -> Result<LabelExpr> {
    let span = pair.as_span();
    let operands = pair
        .into_inner()
        .filter(|p| !matches!(p.as_rule(), Rule::and_op | Rule::or_op))
        .map(|p| build(p, text))
        .collect::<Result<Vec<_>>>()?;

    LabelExpr::combine(operands, wrap).ok_or_else(|| {
        invalid_expression(text, "expected a label", span.start(), span.end() - span.start())
    })
}

fn convert_parse_error(error: pest::error::Error<Rule>, text: &str) -> HarnessError {
    let (start, len) = match error.location {
        InputLocation::Pos(pos) => (pos, 0),
        InputLocation::Span((start, end)) => (start, end - start),
    };

    let message = match &error.variant {
        pest::error::ErrorVariant::ParsingError { positives, .. }
            if positives.contains(&Rule::label) =>
        {
            "expected a label"
        }
        pest::error::ErrorVariant::ParsingError { positives, .. }
            if positives.contains(&Rule::EOI) =>
        {
            "expected `and`, `or` or end of expression"
        }
        _ => "syntax error",
    };

    invalid_expression(text, message, start, len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(text: &str) -> LabelExpr {
        LabelExpr::label(text).unwrap()
    }

    #[test]
    fn parses_a_single_label() {
        assert_eq!(parse_expression("hdfs_to_azure").unwrap(), label("hdfs_to_azure"));
        assert_eq!(parse_expression("  P1  ").unwrap(), label("P1"));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let expr = parse_expression("a or b and c").unwrap();
        assert_eq!(
            expr,
            LabelExpr::Or(vec![label("a"), LabelExpr::And(vec![label("b"), label("c")])])
        );
    }

    #[test]
    fn not_binds_tighter_than_and() {
        let expr = parse_expression("not a and b").unwrap();
        assert_eq!(expr, LabelExpr::And(vec![label("a").not(), label("b")]));
    }

    #[test]
    fn parentheses_override_precedence() {
        let expr = parse_expression("not (a or b)").unwrap();
        assert_eq!(expr, LabelExpr::Or(vec![label("a"), label("b")]).not());
    }

    #[test]
    fn chains_flatten_into_one_node() {
        let expr = parse_expression("a and b and c").unwrap();
        assert_eq!(expr, LabelExpr::And(vec![label("a"), label("b"), label("c")]));
    }

    #[test]
    fn labels_may_start_with_a_keyword() {
        let expr = parse_expression("nothing or order and android").unwrap();
        assert_eq!(
            expr,
            LabelExpr::Or(vec![
                label("nothing"),
                LabelExpr::And(vec![label("order"), label("android")]),
            ])
        );
    }

    #[test]
    fn rejects_malformed_expressions() {
        for text in ["", "   ", "and", "a and", "a or or b", "(a", "a b", "a | b", "not"] {
            assert!(
                matches!(
                    parse_expression(text),
                    Err(HarnessError::InvalidExpression { .. })
                ),
                "{text:?} should be rejected"
            );
        }
    }
}

//! Conditional evaluator.
//!
//! Evaluates a parsed `#if` / `#elif` condition against a [`DefinedSymbolSet`]. The evaluator is total: it runs
//! inline while scanning, so anything it does not understand degrades to a value instead of an error.
//!
//! ## Notes
//! - Identifiers evaluate to set membership.
//! - Non-boolean literals evaluate to `false`.
//! - Operators other than `==`, `!=`, `&&`, `||` are logged and yield the left operand.
//! - Unparseable condition text evaluates to `false` (see [`evaluate_text`]).

use crate::ast::{BinaryOp, CondExpr, Spanned, UnaryOp};
use crate::defines::DefinedSymbolSet;
use crate::expr::parse_condition;

/// Evaluate a parsed condition.
pub fn evaluate(expr: &Spanned<CondExpr>, symbols: &DefinedSymbolSet) -> bool {
    match &expr.node {
        CondExpr::Bool(value) => *value,
        CondExpr::Literal(_) => false,
        CondExpr::Ident(name) => symbols.contains(name),
        CondExpr::Unary(UnaryOp::Not, operand) => !evaluate(operand, symbols),
        CondExpr::Paren(inner) => evaluate(inner, symbols),
        CondExpr::Binary(left, op, right) => {
            let lhs = evaluate(left, symbols);
            match op {
                BinaryOp::And => lhs && evaluate(right, symbols),
                BinaryOp::Or => lhs || evaluate(right, symbols),
                BinaryOp::Eq => lhs == evaluate(right, symbols),
                BinaryOp::NotEq => lhs != evaluate(right, symbols),
                other => {
                    tracing::warn!(operator = %other, span = ?expr.span, "unknown operator in preprocessor condition");
                    lhs
                }
            }
        }
    }
}

/// Parse and evaluate condition text; parse failures yield `false`.
pub fn evaluate_text(text: &str, symbols: &DefinedSymbolSet) -> bool {
    match parse_condition(text) {
        Ok(expr) => evaluate(&expr, symbols),
        Err(err) => {
            tracing::debug!(%err, text, "unparseable preprocessor condition");
            false
        }
    }
}

//! Preprocessor condition parsing.
//!
//! Turns the text after `#if` / `#elif` into a [`CondExpr`](crate::ast::CondExpr) tree.
//!
//! ## Module Structure
//!
//! - `lexer` - condition tokens
//! - `parser` - precedence-ladder parser
//!
//! ## Examples
//! ```rust
//! use hilite_syntax::ast::CondExpr;
//! use hilite_syntax::expr;
//!
//! let parsed = expr::parse_condition("DEBUG && !TRACE").unwrap();
//! assert!(matches!(parsed.node, CondExpr::Binary(..)));
//! assert!(expr::parse_condition("DEBUG &&").is_err());
//! ```

mod lexer;
mod parser;

use thiserror::Error;

use crate::ast::Span;

pub use lexer::{CondToken, CondTokenKind, tokenize};
pub use parser::parse_condition;

/// Why a condition could not be parsed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("unexpected character '{ch}'")]
    UnexpectedChar { ch: char, span: Span },
    #[error("unterminated string literal")]
    UnterminatedString { span: Span },
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        span: Span,
    },
    #[error("empty condition")]
    Empty,
}

impl ExprError {
    /// Location of the problem, relative to the start of the condition text.
    pub fn span(&self) -> Span {
        match self {
            ExprError::UnexpectedChar { span, .. }
            | ExprError::UnterminatedString { span }
            | ExprError::UnexpectedToken { span, .. } => *span,
            ExprError::Empty => Span::default(),
        }
    }
}

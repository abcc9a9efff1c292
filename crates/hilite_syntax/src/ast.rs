//! Source spans and the preprocessor condition AST.
//!
//! Conditions are the expressions that follow `#if` and `#elif`. The grammar is tiny, but the AST keeps every
//! operator the parser accepts so the evaluator can decide what it understands.

use std::fmt;

/// Source location span (byte offsets, half-open)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Whether the two spans share at least one offset, or an empty span sits inside the other.
    pub fn intersects(&self, other: Span) -> bool {
        if self.is_empty() || other.is_empty() {
            return other.start >= self.start && other.start <= self.end
                || self.start >= other.start && self.start <= other.end;
        }
        self.start < other.end && other.start < self.end
    }

    /// Shift both ends by `delta` bytes.
    pub fn offset_by(self, delta: usize) -> Span {
        Span::new(self.start + delta, self.end + delta)
    }
}

/// A node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Identifier text
pub type Ident = String;

/// A preprocessor condition.
#[derive(Debug, Clone, PartialEq)]
pub enum CondExpr {
    Bool(bool),
    /// A literal that is not a boolean (`1`, `"x"`); always evaluates to `false`.
    Literal(Literal),
    Ident(Ident),
    Unary(UnaryOp, Box<Spanned<CondExpr>>),
    Binary(Box<Spanned<CondExpr>>, BinaryOp, Box<Spanned<CondExpr>>),
    Paren(Box<Spanned<CondExpr>>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Understood by the evaluator
    Eq,
    NotEq,
    And,
    Or,
    // Parsed but not evaluated
    Lt,
    LtEq,
    Gt,
    GtEq,
    BitAnd,
    BitOr,
    BitXor,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
        };
        f.write_str(s)
    }
}

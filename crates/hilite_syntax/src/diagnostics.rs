//! Directive diagnostics.
//!
//! The scanner never fails: malformed directives are still painted. It records what it noticed here so
//! tooling (the CLI `tasks` command) can report it next to the semantic QuickTasks.

use crate::ast::Span;

/// A problem found while scanning, with location information
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub message: String,
    pub span: Span,
    pub kind: ErrorKind,
    pub notes: Vec<String>,
    pub hints: Vec<String>,
}

impl CompileError {
    pub fn syntax(message: String, span: Span) -> Self {
        Self {
            message,
            span,
            kind: ErrorKind::Syntax,
            notes: Vec::new(),
            hints: Vec::new(),
        }
    }

    pub fn warning(message: String, span: Span) -> Self {
        Self {
            message,
            span,
            kind: ErrorKind::Warning,
            notes: Vec::new(),
            hints: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Warning,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Syntax => write!(f, "syntax error"),
            ErrorKind::Warning => write!(f, "warning"),
        }
    }
}

/// Common directive diagnostics
pub mod errors {
    use super::*;

    pub fn malformed_condition(directive: &str, detail: &str, span: Span) -> CompileError {
        CompileError::syntax(format!("invalid expression after '#{directive}': {detail}"), span)
            .with_note("the branch is treated as false")
    }

    pub fn unmatched_directive(directive: &str, span: Span) -> CompileError {
        CompileError::warning(format!("'#{directive}' without a matching '#if'"), span)
            .with_hint("the line is highlighted as a plain preprocessor line")
    }

    pub fn missing_symbol(directive: &str, span: Span) -> CompileError {
        CompileError::syntax(format!("expected a symbol name after '#{directive}'"), span)
    }

    pub fn unknown_directive(name: &str, span: Span) -> CompileError {
        CompileError::warning(format!("unknown preprocessor directive '#{name}'"), span)
    }
}

//! miette reports for the `tasks` command.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use hilite_syntax::diagnostics::CompileError;

use crate::semantic::QuickTask;

/// An unresolved name, with source context.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(hilite::unresolved_name), severity(Error))]
pub struct UnresolvedNameReport {
    message: String,
    #[source_code]
    src: NamedSource<String>,
    #[label("not found in the current context")]
    span: SourceSpan,
}

impl UnresolvedNameReport {
    pub fn new(file: &str, source: &str, task: &QuickTask) -> Self {
        Self {
            message: task.message(),
            src: NamedSource::new(file, source.to_string()),
            span: (task.span.start, task.span.len()).into(),
        }
    }
}

/// A directive the scanner could not make sense of.
#[derive(Debug, Error, Diagnostic)]
#[error("{kind}: {message}")]
#[diagnostic(code(hilite::directive), severity(Warning))]
pub struct DirectiveReport {
    kind: String,
    message: String,
    #[source_code]
    src: NamedSource<String>,
    #[label("here")]
    span: SourceSpan,
    #[help]
    help: Option<String>,
}

impl DirectiveReport {
    pub fn new(file: &str, source: &str, error: &CompileError) -> Self {
        let mut help: Vec<&str> = error.notes.iter().map(String::as_str).collect();
        help.extend(error.hints.iter().map(String::as_str));
        Self {
            kind: error.kind.to_string(),
            message: error.message.clone(),
            src: NamedSource::new(file, source.to_string()),
            span: (error.span.start, error.span.len()).into(),
            help: (!help.is_empty()).then(|| help.join("\n")),
        }
    }
}

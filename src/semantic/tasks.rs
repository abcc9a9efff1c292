//! Unresolved-name diagnostics.

use hilite_syntax::ast::Span;
use hilite_syntax::{NodeKind, WalkControl};
use tokio_util::sync::CancellationToken;

use super::model::SemanticModel;
use crate::error::{HighlightError, HighlightResult};

/// Compiler code reported for a name that does not resolve.
pub const UNRESOLVED_NAME_CODE: &str = "CS0103";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A problem-list entry produced by the semantic pass.
///
/// Only the name is stored; the message text is built when asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickTask {
    name: String,
    pub span: Span,
    pub severity: Severity,
}

impl QuickTask {
    pub fn unresolved_name(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
            severity: Severity::Error,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of the task: the identifier's start offset.
    pub fn offset(&self) -> usize {
        self.span.start
    }

    pub fn message(&self) -> String {
        format!(
            "error {UNRESOLVED_NAME_CODE}: The name `{}' does not exist in the current context",
            self.name
        )
    }
}

/// One task per identifier reference in the document that fails to resolve.
///
/// Walks the whole tree, checking `cancel` at every node. A cancelled walk yields
/// [`HighlightError::Cancelled`] and no partial list.
#[tracing::instrument(skip_all, fields(node_count = model.syntax_root().node_count()))]
pub fn collect_quick_tasks(model: &dyn SemanticModel, cancel: &CancellationToken) -> HighlightResult<Vec<QuickTask>> {
    let mut tasks = Vec::new();
    let finished = model.syntax_root().walk(&mut |node| {
        if cancel.is_cancelled() {
            return WalkControl::Stop;
        }
        if node.kind == NodeKind::IdentifierName && model.symbol_info(node).is_none() {
            if let Some(name) = &node.name {
                tasks.push(QuickTask::unresolved_name(name.node.as_str(), name.span));
            }
        }
        WalkControl::Continue
    });
    if !finished {
        return Err(HighlightError::Cancelled);
    }
    tracing::debug!(count = tasks.len(), "quick tasks collected");
    Ok(tasks)
}

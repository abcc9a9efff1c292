//! Engine error type.
//!
//! Failures here never reach the render path: the reactor logs them and the session keeps painting lexically.

use hilite_syntax::EditError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The provider could not produce a model for the snapshot.
    #[error("no semantic model available for '{0}'")]
    ModelUnavailable(String),

    #[error("semantic analysis failed: {0}")]
    Analysis(String),

    /// Cooperative cancellation. Not a failure: callers drop the pass silently.
    #[error("semantic pass cancelled")]
    Cancelled,

    #[error(transparent)]
    Edit(#[from] EditError),
}

impl HighlightError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, HighlightError::Cancelled)
    }
}

pub type HighlightResult<T> = Result<T, HighlightError>;

//! Syntax layer for hilite.
//!
//! Everything here is synchronous and single-document: directive expressions, the preprocessor span stack, the
//! line scanner, the incremental [`highlighter::DocumentHighlighter`] and the outline parser that feeds the
//! semantic layer.

pub mod ast;
pub mod defines;
pub mod diagnostics;
pub mod eval;
pub mod expr;
pub mod grammar;
pub mod highlighter;
pub mod outline;
pub mod scanner;
pub mod span;
pub mod tree;

pub use defines::DefinedSymbolSet;
pub use grammar::Grammar;
pub use highlighter::{DirtyLines, DocumentHighlighter, EditError};
pub use scanner::{Chunk, LineScanner, ScanOptions, ScannedLine, TokenClass};
pub use span::{Rule, SpanStack};
pub use tree::{NodeKind, SyntaxNode, TypeKind, WalkControl};

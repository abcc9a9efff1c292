//! Model and provider contracts.

use std::sync::Arc;

use hilite_syntax::ast::Span;
use hilite_syntax::{DefinedSymbolSet, SyntaxNode};
use tokio_util::sync::CancellationToken;

use crate::error::HighlightResult;

/// What a resolved name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Namespace,
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
    TypeParameter,
    Method,
    Field,
    Property,
    Event,
    EnumMember,
    Parameter,
    Local,
}

impl SymbolKind {
    pub fn is_type(self) -> bool {
        matches!(
            self,
            SymbolKind::Class
                | SymbolKind::Struct
                | SymbolKind::Interface
                | SymbolKind::Enum
                | SymbolKind::Delegate
                | SymbolKind::TypeParameter
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    pub name: String,
    pub kind: SymbolKind,
    /// Declaration site in this document; `None` for framework names.
    pub declared_at: Option<Span>,
}

impl SymbolInfo {
    pub fn new(name: impl Into<String>, kind: SymbolKind, declared_at: Option<Span>) -> Self {
        Self {
            name: name.into(),
            kind,
            declared_at,
        }
    }
}

/// A resolved view of one document version.
pub trait SemanticModel: Send + Sync {
    fn syntax_root(&self) -> &SyntaxNode;

    /// The symbol a name node refers to, or `None` when it does not resolve.
    fn symbol_info(&self, node: &SyntaxNode) -> Option<SymbolInfo>;
}

/// Immutable input of one semantic pass.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    pub name: String,
    pub version: u64,
    pub text: Arc<str>,
    pub defines: DefinedSymbolSet,
}

/// Produces semantic models. Runs on a blocking background thread.
pub trait ModelProvider: Send + Sync {
    /// `Ok(None)` means no model is available for this document.
    fn semantic_model(
        &self,
        snapshot: &DocumentSnapshot,
        cancel: &CancellationToken,
    ) -> HighlightResult<Option<Arc<dyn SemanticModel>>>;
}

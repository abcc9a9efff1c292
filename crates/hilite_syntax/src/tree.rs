//! Syntax tree produced by the outline parser.
//!
//! The tree is a tagged-variant structure: every node is a [`SyntaxNode`] whose [`NodeKind`] says what it is.
//! Consumers dispatch with a `match` on the kind and walk children with [`SyntaxNode::walk`].
//!
//! Declarations carry a `name`; reference nodes (identifier names, member accesses, type references) carry a
//! `name` whose span equals the node span. The name start offset is unique per named node and is what semantic
//! models key their resolutions on.

use crate::ast::{Ident, Span, Spanned};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
    Record,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    CompilationUnit,
    Namespace,
    TypeDeclaration(TypeKind),
    TypeParameter,
    Method,
    Constructor,
    Field,
    Property,
    Event,
    EnumMember,
    Parameter,
    Local,
    Accessor,
    Block,
    TypeReference,
    IdentifierName,
    MemberAccess,
    ContextualKeyword,
}

impl NodeKind {
    /// Whether the node declares the symbol its name refers to.
    pub fn is_declaration(self) -> bool {
        matches!(
            self,
            NodeKind::TypeDeclaration(_)
                | NodeKind::TypeParameter
                | NodeKind::Method
                | NodeKind::Constructor
                | NodeKind::Field
                | NodeKind::Property
                | NodeKind::Event
                | NodeKind::EnumMember
                | NodeKind::Parameter
                | NodeKind::Local
        )
    }

    /// Whether the node is a name reference that a semantic model resolves.
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            NodeKind::TypeReference | NodeKind::IdentifierName | NodeKind::MemberAccess
        )
    }
}

/// What a walk callback wants next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    Continue,
    SkipChildren,
    Stop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub span: Span,
    pub name: Option<Spanned<Ident>>,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            name: None,
            children: Vec::new(),
        }
    }

    /// A reference node whose span is its name.
    pub fn reference(kind: NodeKind, name: impl Into<Ident>, span: Span) -> Self {
        Self {
            kind,
            span,
            name: Some(Spanned::new(name.into(), span)),
            children: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<Ident>, span: Span) -> Self {
        self.name = Some(Spanned::new(name.into(), span));
        self
    }

    pub fn with_children(mut self, children: Vec<SyntaxNode>) -> Self {
        self.children = children;
        self
    }

    pub fn name_text(&self) -> Option<&str> {
        self.name.as_ref().map(|name| name.node.as_str())
    }

    pub fn name_span(&self) -> Option<Span> {
        self.name.as_ref().map(|name| name.span)
    }

    /// Pre-order walk over an explicit stack. Returns `false` if the callback stopped it.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a SyntaxNode) -> WalkControl) -> bool {
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match visit(node) {
                WalkControl::Stop => return false,
                WalkControl::SkipChildren => {}
                WalkControl::Continue => pending.extend(node.children.iter().rev()),
            }
        }
        true
    }

    /// Total number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_| {
            count += 1;
            WalkControl::Continue
        });
        count
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 1)];
        while let Some((node, depth)) = pending.pop() {
            deepest = deepest.max(depth);
            pending.extend(node.children.iter().map(|child| (child, depth + 1)));
        }
        deepest
    }

    /// Innermost named node whose name contains `offset`.
    pub fn named_at(&self, offset: usize) -> Option<&SyntaxNode> {
        let mut found = None;
        self.walk(&mut |node| {
            if node.name_span().is_some_and(|span| span.contains(offset)) {
                found = Some(node);
            }
            if node.span.contains(offset) || node.kind == NodeKind::CompilationUnit {
                WalkControl::Continue
            } else {
                WalkControl::SkipChildren
            }
        });
        found
    }
}

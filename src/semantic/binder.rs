//! Outline-backed semantic model.
//!
//! [`OutlineModelProvider`] parses a snapshot with the outline parser and binds every name node against a
//! scoped symbol table. Lookup order for a simple name:
//!
//! 1. locals, parameters and type parameters, innermost scope first
//! 2. members of the enclosing types, innermost type first
//! 3. type names declared anywhere in the document
//! 4. members of any declared type
//! 5. a small table of well-known framework names
//!
//! Type references only consult type parameters, declared types and the framework table. Member accesses
//! (`x.Name`) resolve only against declared members and types.

use std::collections::HashMap;
use std::sync::Arc;

use hilite_syntax::ast::Span;
use hilite_syntax::outline::parse_outline;
use hilite_syntax::{Grammar, NodeKind, SyntaxNode, TypeKind};
use tokio_util::sync::CancellationToken;

use super::model::{DocumentSnapshot, ModelProvider, SemanticModel, SymbolInfo, SymbolKind};
use crate::error::{HighlightError, HighlightResult};

/// Framework names resolvable without a reference assembly.
const FRAMEWORK_NAMES: &[(&str, SymbolKind)] = &[
    ("System", SymbolKind::Namespace),
    ("Collections", SymbolKind::Namespace),
    ("Generic", SymbolKind::Namespace),
    ("Linq", SymbolKind::Namespace),
    ("Threading", SymbolKind::Namespace),
    ("Tasks", SymbolKind::Namespace),
    ("IO", SymbolKind::Namespace),
    ("Text", SymbolKind::Namespace),
    ("Object", SymbolKind::Class),
    ("String", SymbolKind::Class),
    ("Console", SymbolKind::Class),
    ("Math", SymbolKind::Class),
    ("Convert", SymbolKind::Class),
    ("Environment", SymbolKind::Class),
    ("Array", SymbolKind::Class),
    ("Enumerable", SymbolKind::Class),
    ("Activator", SymbolKind::Class),
    ("GC", SymbolKind::Class),
    ("Type", SymbolKind::Class),
    ("Attribute", SymbolKind::Class),
    ("Exception", SymbolKind::Class),
    ("ArgumentException", SymbolKind::Class),
    ("ArgumentNullException", SymbolKind::Class),
    ("ArgumentOutOfRangeException", SymbolKind::Class),
    ("InvalidOperationException", SymbolKind::Class),
    ("NotImplementedException", SymbolKind::Class),
    ("NotSupportedException", SymbolKind::Class),
    ("EventArgs", SymbolKind::Class),
    ("List", SymbolKind::Class),
    ("Dictionary", SymbolKind::Class),
    ("HashSet", SymbolKind::Class),
    ("Queue", SymbolKind::Class),
    ("Stack", SymbolKind::Class),
    ("Lazy", SymbolKind::Class),
    ("Tuple", SymbolKind::Class),
    ("Task", SymbolKind::Class),
    ("Thread", SymbolKind::Class),
    ("Interlocked", SymbolKind::Class),
    ("Monitor", SymbolKind::Class),
    ("StringBuilder", SymbolKind::Class),
    ("Encoding", SymbolKind::Class),
    ("Regex", SymbolKind::Class),
    ("Uri", SymbolKind::Class),
    ("Random", SymbolKind::Class),
    ("Path", SymbolKind::Class),
    ("File", SymbolKind::Class),
    ("Directory", SymbolKind::Class),
    ("Stream", SymbolKind::Class),
    ("TextReader", SymbolKind::Class),
    ("TextWriter", SymbolKind::Class),
    ("Int16", SymbolKind::Struct),
    ("Int32", SymbolKind::Struct),
    ("Int64", SymbolKind::Struct),
    ("Boolean", SymbolKind::Struct),
    ("Double", SymbolKind::Struct),
    ("Decimal", SymbolKind::Struct),
    ("Char", SymbolKind::Struct),
    ("DateTime", SymbolKind::Struct),
    ("TimeSpan", SymbolKind::Struct),
    ("Guid", SymbolKind::Struct),
    ("Nullable", SymbolKind::Struct),
    ("KeyValuePair", SymbolKind::Struct),
    ("ValueTuple", SymbolKind::Struct),
    ("CancellationToken", SymbolKind::Struct),
    ("IDisposable", SymbolKind::Interface),
    ("IEnumerable", SymbolKind::Interface),
    ("IEnumerator", SymbolKind::Interface),
    ("ICollection", SymbolKind::Interface),
    ("IList", SymbolKind::Interface),
    ("IDictionary", SymbolKind::Interface),
    ("IComparable", SymbolKind::Interface),
    ("IEquatable", SymbolKind::Interface),
    ("Action", SymbolKind::Delegate),
    ("Func", SymbolKind::Delegate),
    ("Predicate", SymbolKind::Delegate),
    ("EventHandler", SymbolKind::Delegate),
    ("StringComparison", SymbolKind::Enum),
    ("ConsoleColor", SymbolKind::Enum),
];

fn framework_symbol(name: &str) -> Option<SymbolInfo> {
    FRAMEWORK_NAMES
        .iter()
        .find(|(known, _)| *known == name)
        .map(|&(known, kind)| SymbolInfo::new(known, kind, None))
}

fn type_symbol_kind(kind: TypeKind) -> SymbolKind {
    match kind {
        TypeKind::Class | TypeKind::Record => SymbolKind::Class,
        TypeKind::Struct => SymbolKind::Struct,
        TypeKind::Interface => SymbolKind::Interface,
        TypeKind::Enum => SymbolKind::Enum,
        TypeKind::Delegate => SymbolKind::Delegate,
    }
}

fn member_symbol_kind(kind: NodeKind) -> Option<SymbolKind> {
    match kind {
        NodeKind::Method => Some(SymbolKind::Method),
        NodeKind::Field => Some(SymbolKind::Field),
        NodeKind::Property => Some(SymbolKind::Property),
        NodeKind::Event => Some(SymbolKind::Event),
        NodeKind::EnumMember => Some(SymbolKind::EnumMember),
        _ => None,
    }
}

fn named(node: &SyntaxNode) -> Option<(&str, Span)> {
    node.name.as_ref().map(|name| (name.node.as_str(), name.span))
}

/// Outline tree plus the symbol each name node resolved to, keyed by name start offset.
#[derive(Debug)]
pub struct OutlineModel {
    root: SyntaxNode,
    resolutions: HashMap<usize, SymbolInfo>,
}

impl OutlineModel {
    /// Bind every name in `root`. Checks `cancel` once per node.
    #[tracing::instrument(skip_all, fields(node_count = root.node_count()))]
    pub fn bind(root: SyntaxNode, cancel: &CancellationToken) -> HighlightResult<Self> {
        let resolutions = {
            let mut binder = Binder::new(Declarations::collect(&root), cancel);
            binder.bind(&root)?;
            binder.resolutions
        };
        tracing::debug!(resolved = resolutions.len(), "outline bound");
        Ok(Self { root, resolutions })
    }

    pub fn resolved_count(&self) -> usize {
        self.resolutions.len()
    }
}

impl SemanticModel for OutlineModel {
    fn syntax_root(&self) -> &SyntaxNode {
        &self.root
    }

    fn symbol_info(&self, node: &SyntaxNode) -> Option<SymbolInfo> {
        let span = node.name_span()?;
        self.resolutions.get(&span.start).cloned()
    }
}

/// Builds [`OutlineModel`]s from document snapshots.
#[derive(Debug, Clone)]
pub struct OutlineModelProvider {
    grammar: Arc<Grammar>,
}

impl OutlineModelProvider {
    pub fn new(grammar: Arc<Grammar>) -> Self {
        Self { grammar }
    }
}

impl ModelProvider for OutlineModelProvider {
    fn semantic_model(
        &self,
        snapshot: &DocumentSnapshot,
        cancel: &CancellationToken,
    ) -> HighlightResult<Option<Arc<dyn SemanticModel>>> {
        if cancel.is_cancelled() {
            return Err(HighlightError::Cancelled);
        }
        let root = parse_outline(&snapshot.text, &self.grammar, &snapshot.defines);
        if cancel.is_cancelled() {
            return Err(HighlightError::Cancelled);
        }
        let model = OutlineModel::bind(root, cancel)?;
        Ok(Some(Arc::new(model)))
    }
}

/// Document-wide declarations, gathered before binding so forward references resolve.
#[derive(Debug, Default)]
struct Declarations<'t> {
    types: HashMap<&'t str, SymbolInfo>,
    /// Members per type, keyed by the type's name start offset
    members: HashMap<usize, HashMap<&'t str, SymbolInfo>>,
    any_member: HashMap<&'t str, SymbolInfo>,
}

impl<'t> Declarations<'t> {
    fn collect(root: &'t SyntaxNode) -> Self {
        let mut decls = Self::default();
        decls.visit(root, None);
        decls
    }

    fn visit(&mut self, node: &'t SyntaxNode, owner: Option<usize>) {
        match node.kind {
            NodeKind::CompilationUnit | NodeKind::Namespace => {
                for child in &node.children {
                    self.visit(child, owner);
                }
            }
            NodeKind::TypeDeclaration(kind) => {
                let Some((name, span)) = named(node) else {
                    return;
                };
                self.types
                    .entry(name)
                    .or_insert_with(|| SymbolInfo::new(name, type_symbol_kind(kind), Some(span)));
                for child in &node.children {
                    self.visit(child, Some(span.start));
                }
            }
            kind => {
                let (Some(owner), Some(symbol_kind), Some((name, span))) =
                    (owner, member_symbol_kind(kind), named(node))
                else {
                    return;
                };
                let info = SymbolInfo::new(name, symbol_kind, Some(span));
                self.any_member.entry(name).or_insert_with(|| info.clone());
                self.members.entry(owner).or_default().entry(name).or_insert(info);
            }
        }
    }
}

struct Binder<'t, 'c> {
    decls: Declarations<'t>,
    scopes: Vec<HashMap<&'t str, SymbolInfo>>,
    /// Enclosing type declarations, keyed like [`Declarations::members`]
    owners: Vec<usize>,
    resolutions: HashMap<usize, SymbolInfo>,
    cancel: &'c CancellationToken,
}

impl<'t, 'c> Binder<'t, 'c> {
    fn new(decls: Declarations<'t>, cancel: &'c CancellationToken) -> Self {
        Self {
            decls,
            scopes: vec![HashMap::new()],
            owners: Vec::new(),
            resolutions: HashMap::new(),
            cancel,
        }
    }

    fn bind(&mut self, node: &'t SyntaxNode) -> HighlightResult<()> {
        if self.cancel.is_cancelled() {
            return Err(HighlightError::Cancelled);
        }

        match node.kind {
            NodeKind::CompilationUnit => {
                self.declare_local_functions(node);
                self.bind_children(node)
            }
            NodeKind::Namespace => self.bind_children(node),
            NodeKind::TypeDeclaration(kind) => {
                let Some((name, span)) = named(node) else {
                    return self.scoped(node);
                };
                self.resolve(span, Some(SymbolInfo::new(name, type_symbol_kind(kind), Some(span))));
                self.owners.push(span.start);
                let result = self.scoped(node);
                self.owners.pop();
                result
            }
            NodeKind::Constructor => {
                if let Some((name, span)) = named(node) {
                    let info = self.decls.types.get(name).cloned();
                    self.resolve(span, info);
                }
                self.scoped(node)
            }
            NodeKind::Method | NodeKind::Field | NodeKind::Property | NodeKind::Event | NodeKind::EnumMember => {
                if let (Some(kind), Some((name, span))) = (member_symbol_kind(node.kind), named(node)) {
                    self.resolve(span, Some(SymbolInfo::new(name, kind, Some(span))));
                }
                self.scoped(node)
            }
            NodeKind::Block => {
                self.scopes.push(HashMap::new());
                self.declare_local_functions(node);
                let result = self.bind_children(node);
                self.scopes.pop();
                result
            }
            NodeKind::Accessor => self.scoped(node),
            NodeKind::TypeParameter | NodeKind::Parameter | NodeKind::Local => {
                self.bind_children(node)?;
                let kind = match node.kind {
                    NodeKind::TypeParameter => SymbolKind::TypeParameter,
                    NodeKind::Parameter => SymbolKind::Parameter,
                    _ => SymbolKind::Local,
                };
                if let Some((name, span)) = named(node) {
                    let info = SymbolInfo::new(name, kind, Some(span));
                    self.declare(name, info.clone());
                    self.resolve(span, Some(info));
                }
                Ok(())
            }
            NodeKind::TypeReference => {
                if let Some((name, span)) = named(node) {
                    let info = self.lookup_type(name);
                    self.resolve(span, info);
                }
                Ok(())
            }
            NodeKind::IdentifierName => {
                if let Some((name, span)) = named(node) {
                    let info = self.lookup_name(name);
                    self.resolve(span, info);
                }
                Ok(())
            }
            NodeKind::MemberAccess => {
                if let Some((name, span)) = named(node) {
                    let info = self.lookup_member(name);
                    self.resolve(span, info);
                }
                Ok(())
            }
            NodeKind::ContextualKeyword => Ok(()),
        }
    }

    fn bind_children(&mut self, node: &'t SyntaxNode) -> HighlightResult<()> {
        node.children.iter().try_for_each(|child| self.bind(child))
    }

    /// Bind children inside a fresh scope.
    fn scoped(&mut self, node: &'t SyntaxNode) -> HighlightResult<()> {
        self.scopes.push(HashMap::new());
        let result = self.bind_children(node);
        self.scopes.pop();
        result
    }

    /// Local functions are visible from the start of their block.
    fn declare_local_functions(&mut self, node: &'t SyntaxNode) {
        for child in node.children.iter().filter(|child| child.kind == NodeKind::Method) {
            if let Some((name, span)) = named(child) {
                self.declare(name, SymbolInfo::new(name, SymbolKind::Method, Some(span)));
            }
        }
    }

    fn declare(&mut self, name: &'t str, info: SymbolInfo) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, info);
        }
    }

    fn resolve(&mut self, span: Span, info: Option<SymbolInfo>) {
        if let Some(info) = info {
            self.resolutions.insert(span.start, info);
        }
    }

    fn lookup_scopes(&self, name: &str) -> Option<&SymbolInfo> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn lookup_name(&self, name: &str) -> Option<SymbolInfo> {
        self.lookup_scopes(name)
            .or_else(|| {
                self.owners
                    .iter()
                    .rev()
                    .find_map(|owner| self.decls.members.get(owner)?.get(name))
            })
            .or_else(|| self.decls.types.get(name))
            .or_else(|| self.decls.any_member.get(name))
            .cloned()
            .or_else(|| framework_symbol(name))
    }

    fn lookup_type(&self, name: &str) -> Option<SymbolInfo> {
        self.lookup_scopes(name)
            .filter(|info| info.kind == SymbolKind::TypeParameter)
            .or_else(|| self.decls.types.get(name))
            .cloned()
            .or_else(|| framework_symbol(name))
            .filter(|info| info.kind != SymbolKind::Namespace)
    }

    fn lookup_member(&self, name: &str) -> Option<SymbolInfo> {
        self.decls
            .any_member
            .get(name)
            .or_else(|| self.decls.types.get(name))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hilite_syntax::DefinedSymbolSet;

    fn model(text: &str) -> OutlineModel {
        let root = parse_outline(text, &Grammar::csharp(), &DefinedSymbolSet::new());
        OutlineModel::bind(root, &CancellationToken::new()).unwrap()
    }

    /// Resolved kind of the first name node spelled `name` after byte offset `from`.
    fn kind_at(model: &OutlineModel, text: &str, name: &str, from: usize) -> Option<SymbolKind> {
        let offset = text[from..].find(name).map(|i| i + from)?;
        let node = model.syntax_root().named_at(offset)?;
        model.symbol_info(node).map(|info| info.kind)
    }

    #[test]
    fn test_locals_shadow_members() {
        let text = "class A { int x; void M(int y) { int x = y; Use(x); } void N() { Use(x); } void Use(int v) { } }";
        let model = model(text);
        let first_use = text.find("Use(x)").unwrap();
        assert_eq!(kind_at(&model, text, "x", first_use), Some(SymbolKind::Local));
        let second_use = text.rfind("Use(x)").unwrap();
        assert_eq!(kind_at(&model, text, "x", second_use), Some(SymbolKind::Field));
        assert_eq!(kind_at(&model, text, "y", first_use - 4), Some(SymbolKind::Parameter));
        assert_eq!(kind_at(&model, text, "Use", first_use), Some(SymbolKind::Method));
    }

    #[test]
    fn test_forward_references_and_types() {
        let text = "class A { B Make() { return new B(); } } struct B { } interface IC { }";
        let model = model(text);
        assert_eq!(kind_at(&model, text, "B", 0), Some(SymbolKind::Struct));
        assert_eq!(kind_at(&model, text, "IC", 0), Some(SymbolKind::Interface));
        assert_eq!(kind_at(&model, text, "Make", 0), Some(SymbolKind::Method));
    }

    #[test]
    fn test_type_parameters_and_framework_names() {
        let text = "class Box<T> { T item; List<T> all; void M() { Console.WriteLine(item); } }";
        let model = model(text);
        let field = text.find("T item").unwrap();
        assert_eq!(kind_at(&model, text, "T", field), Some(SymbolKind::TypeParameter));
        assert_eq!(kind_at(&model, text, "List", 0), Some(SymbolKind::Class));
        assert_eq!(kind_at(&model, text, "Console", 0), Some(SymbolKind::Class));
        assert_eq!(kind_at(&model, text, "WriteLine", 0), None);
    }

    #[test]
    fn test_unknown_name_does_not_resolve() {
        let text = "class A { void M() { Missing(); } }";
        let model = model(text);
        assert_eq!(kind_at(&model, text, "Missing", 0), None);
    }

    #[test]
    fn test_constructor_resolves_to_type() {
        let text = "class Widget { public Widget() { } }";
        let model = model(text);
        let ctor = text.find("Widget()").unwrap();
        assert_eq!(kind_at(&model, text, "Widget", ctor), Some(SymbolKind::Class));
    }

    #[test]
    fn test_local_function_visible_before_declaration() {
        let text = "class A { void M() { Helper(); void Helper() { } } }";
        let model = model(text);
        assert_eq!(kind_at(&model, text, "Helper", 0), Some(SymbolKind::Method));
    }

    #[test]
    fn test_deeply_nested_source_binds_on_a_small_stack() {
        let text = format!("class A {{ void M() {{ {}Missing(); }} }}", "{".repeat(100_000));
        let (resolved, tasks) = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || {
                let model = model(&text);
                let tasks = crate::semantic::collect_quick_tasks(&model, &CancellationToken::new()).unwrap();
                (model.resolved_count(), tasks.len())
            })
            .unwrap()
            .join()
            .unwrap();
        // `A` and `M`; the body past the nesting cap is skipped.
        assert_eq!(resolved, 2);
        assert_eq!(tasks, 0);
    }

    #[test]
    fn test_cancelled_bind() {
        let root = parse_outline("class A { }", &Grammar::csharp(), &DefinedSymbolSet::new());
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(OutlineModel::bind(root, &cancel), Err(HighlightError::Cancelled)));
    }
}

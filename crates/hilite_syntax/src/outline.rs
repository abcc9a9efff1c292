//! Outline parser: a tolerant C# parser over active tokens.
//!
//! The parser reads the tokens the line scanner produces for active code (excluded branches, comments and
//! directives never reach it) and builds a [`SyntaxNode`] tree good enough for symbol binding: declarations,
//! scopes, type references and name references. It never fails. Anything it does not understand is consumed as
//! an expression token run, and every loop is guaranteed to make progress.
//!
//! ## Notes
//! - Generic argument lists in expressions are recognized speculatively: `Foo<int>(x)` is a generic call,
//!   `a < b` is a comparison.
//! - `value` inside an accessor body becomes a [`NodeKind::ContextualKeyword`] node.
//! - `var` is a type reference; the semantic layer decides how to paint it.
//! - Nesting is capped at [`MAX_NESTING`] levels of blocks, statements, expressions, types and type bodies.
//!   Deeper constructs are skipped as balanced token runs, so the tree depth stays bounded.

use hilite_core::lang::keywords::{self, KeywordId};

use crate::ast::Span;
use crate::defines::DefinedSymbolSet;
use crate::grammar::Grammar;
use crate::scanner::{LineScanner, ScanOptions, TokenClass};
use crate::tree::{NodeKind, SyntaxNode, TypeKind};

/// Deepest nesting the parser descends into.
pub const MAX_NESTING: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokKind {
    Ident,
    Keyword(KeywordId),
    Punct(char),
    Literal,
}

#[derive(Debug, Clone, Copy)]
struct Tok<'s> {
    kind: TokKind,
    span: Span,
    text: &'s str,
}

impl<'s> Tok<'s> {
    /// Identifier text without a verbatim `@` prefix.
    fn name(&self) -> &'s str {
        self.text.strip_prefix('@').unwrap_or(self.text)
    }
}

/// Parse `text` into an outline tree, skipping code excluded under `defines`.
#[tracing::instrument(skip_all, fields(source_len = text.len()))]
pub fn parse_outline(text: &str, grammar: &Grammar, defines: &DefinedSymbolSet) -> SyntaxNode {
    let toks = active_tokens(text, grammar, defines);
    let token_count = toks.len();
    let mut parser = Parser::new(toks);
    let children = parser.members(false);
    let root = SyntaxNode::new(NodeKind::CompilationUnit, Span::new(0, text.len())).with_children(children);
    tracing::debug!(token_count, node_count = root.node_count(), "outline parsed");
    root
}

fn active_tokens<'s>(text: &'s str, grammar: &Grammar, defines: &DefinedSymbolSet) -> Vec<Tok<'s>> {
    let options = ScanOptions::default();
    let scanner = LineScanner::new(grammar, &options, defines);
    let mut toks = Vec::new();
    for line in scanner.scan_text(text) {
        for chunk in line.chunks {
            let Some(slice) = text.get(chunk.offset..chunk.end()) else {
                continue;
            };
            let kind = match chunk.class {
                TokenClass::Identifier => TokKind::Ident,
                TokenClass::Keyword(id) => TokKind::Keyword(id),
                TokenClass::Punctuation => match slice.chars().next() {
                    Some(c) => TokKind::Punct(c),
                    None => continue,
                },
                TokenClass::Number | TokenClass::String | TokenClass::Char => TokKind::Literal,
                _ => continue,
            };
            toks.push(Tok {
                kind,
                span: chunk.span(),
                text: slice,
            });
        }
    }
    toks
}

struct Parser<'s> {
    toks: Vec<Tok<'s>>,
    pos: usize,
    /// Inside a property, indexer or event accessor body.
    in_accessor: bool,
    /// Names of the enclosing type declarations, innermost last.
    type_names: Vec<&'s str>,
    depth: usize,
}

impl<'s> Parser<'s> {
    fn new(toks: Vec<Tok<'s>>) -> Self {
        Self {
            toks,
            pos: 0,
            in_accessor: false,
            type_names: Vec::new(),
            depth: 0,
        }
    }

    // ========================================================================
    // Token helpers
    // ========================================================================

    fn peek(&self) -> Option<Tok<'s>> {
        self.toks.get(self.pos).copied()
    }

    fn kind_at(&self, n: usize) -> Option<TokKind> {
        self.toks.get(self.pos + n).map(|t| t.kind)
    }

    fn bump(&mut self) -> Option<Tok<'s>> {
        let tok = self.peek()?;
        self.pos += 1;
        Some(tok)
    }

    fn punct_at(&self, n: usize, c: char) -> bool {
        self.kind_at(n) == Some(TokKind::Punct(c))
    }

    fn at_punct(&self, c: char) -> bool {
        self.punct_at(0, c)
    }

    fn at_keyword(&self, id: KeywordId) -> bool {
        self.kind_at(0) == Some(TokKind::Keyword(id))
    }

    fn at_ident(&self) -> bool {
        self.kind_at(0) == Some(TokKind::Ident)
    }

    fn at_ident_text(&self, text: &str) -> bool {
        self.peek().is_some_and(|t| t.kind == TokKind::Ident && t.text == text)
    }

    fn eat_punct(&mut self, c: char) -> bool {
        let found = self.at_punct(c);
        if found {
            self.pos += 1;
        }
        found
    }

    fn eat_keyword(&mut self, id: KeywordId) -> bool {
        let found = self.at_keyword(id);
        if found {
            self.pos += 1;
        }
        found
    }

    fn eat_ident(&mut self) -> Option<Tok<'s>> {
        if self.at_ident() { self.bump() } else { None }
    }

    /// `=>` at offset `n` (two adjacent punctuation tokens).
    fn arrow_at(&self, n: usize) -> bool {
        self.punct_at(n, '=')
            && self.punct_at(n + 1, '>')
            && self.toks[self.pos + n].span.end == self.toks[self.pos + n + 1].span.start
    }

    fn start(&self) -> usize {
        self.peek().map_or_else(|| self.prev_end(), |t| t.span.start)
    }

    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.toks.get(i))
            .map_or(0, |t| t.span.end)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.prev_end().max(start))
    }

    /// Skip a bracketed group starting at `open`, nested groups included.
    fn skip_balanced(&mut self, open: char, close: char) {
        let mut depth = 0usize;
        while let Some(tok) = self.bump() {
            match tok.kind {
                TokKind::Punct(c) if c == open => depth += 1,
                TokKind::Punct(c) if c == close => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    /// Skip what `expr_run` would consume: up to a stop character at depth zero, or an unmatched closer.
    fn skip_run(&mut self, stops: &[char]) {
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            match tok.kind {
                TokKind::Punct(c) if depth == 0 && (stops.contains(&c) || matches!(c, ')' | ']' | '}')) => break,
                TokKind::Punct('(' | '[' | '{') => depth += 1,
                TokKind::Punct(')' | ']' | '}') => depth -= 1,
                _ => {}
            }
            self.pos += 1;
        }
    }

    /// Descend one nesting level. Returns `false` at the cap; a `true` must be paired with [`Self::leave`].
    fn enter(&mut self) -> bool {
        if self.depth >= MAX_NESTING {
            return false;
        }
        self.depth += 1;
        true
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn skip_past(&mut self, c: char) {
        while let Some(tok) = self.bump() {
            if tok.kind == TokKind::Punct(c) {
                break;
            }
        }
    }

    fn skip_attributes(&mut self) {
        while self.at_punct('[') {
            self.skip_balanced('[', ']');
        }
    }

    fn skip_modifiers(&mut self) {
        while let Some(TokKind::Keyword(id)) = self.kind_at(0) {
            if !keywords::is_modifier(id) {
                break;
            }
            self.pos += 1;
        }
    }

    /// Run `f` without consuming anything; returns its result.
    fn lookahead(&mut self, f: impl FnOnce(&mut Self) -> bool) -> bool {
        let save = self.pos;
        let found = f(self);
        self.pos = save;
        found
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    /// Members until end of input, or until `}` when `braced`.
    fn members(&mut self, braced: bool) -> Vec<SyntaxNode> {
        let mut out = Vec::new();
        if !self.enter() {
            self.skip_run(&[]);
            return out;
        }
        while let Some(tok) = self.peek() {
            if braced && tok.kind == TokKind::Punct('}') {
                break;
            }
            let before = self.pos;
            self.member(&mut out);
            if self.pos == before {
                self.pos += 1;
            }
        }
        self.leave();
        out
    }

    fn member(&mut self, out: &mut Vec<SyntaxNode>) {
        self.skip_attributes();
        let start = self.start();
        let in_type = !self.type_names.is_empty();

        match self.kind_at(0) {
            Some(TokKind::Keyword(KeywordId::Using)) if !self.punct_at(1, '(') && !in_type => {
                if self.lookahead(|p| {
                    p.pos += 1;
                    p.looks_like_local_decl()
                }) {
                    self.statement(out);
                } else {
                    self.skip_past(';');
                }
                return;
            }
            Some(TokKind::Keyword(KeywordId::Namespace)) => {
                out.push(self.namespace(start));
                return;
            }
            Some(TokKind::Punct(';')) => {
                self.pos += 1;
                return;
            }
            _ => {}
        }

        let before_modifiers = self.pos;
        self.skip_modifiers();
        if in_type {
            self.eat_keyword(KeywordId::New);
        }
        match self.kind_at(0) {
            Some(TokKind::Keyword(KeywordId::Class)) => self.type_declaration(start, TypeKind::Class, out),
            Some(TokKind::Keyword(KeywordId::Struct)) => self.type_declaration(start, TypeKind::Struct, out),
            Some(TokKind::Keyword(KeywordId::Interface)) => {
                self.type_declaration(start, TypeKind::Interface, out)
            }
            Some(TokKind::Keyword(KeywordId::Record)) => self.type_declaration(start, TypeKind::Record, out),
            Some(TokKind::Keyword(KeywordId::Enum)) => self.enum_declaration(start, out),
            Some(TokKind::Keyword(KeywordId::Delegate)) => self.delegate_declaration(start, out),
            Some(TokKind::Keyword(KeywordId::Event)) => self.event_declaration(start, out),
            _ if in_type => self.typed_member(start, out),
            _ if self.looks_like_local_function() => self.typed_member(start, out),
            _ => {
                // Top-level statements
                self.pos = before_modifiers;
                self.statement(out);
            }
        }
    }

    fn namespace(&mut self, start: usize) -> SyntaxNode {
        self.pos += 1;
        let mut name = String::new();
        let mut name_span: Option<Span> = None;
        while let Some(tok) = self.eat_ident() {
            name.push_str(tok.name());
            name_span = Some(name_span.map_or(tok.span, |span| span.merge(tok.span)));
            if !self.eat_punct('.') {
                break;
            }
            name.push('.');
        }
        let children = if self.eat_punct('{') {
            let members = self.members(true);
            self.eat_punct('}');
            members
        } else {
            self.eat_punct(';');
            self.members(false)
        };
        let mut node = SyntaxNode::new(NodeKind::Namespace, self.span_from(start)).with_children(children);
        if let Some(span) = name_span {
            node = node.with_name(name, span);
        }
        node
    }

    fn type_declaration(&mut self, start: usize, kind: TypeKind, out: &mut Vec<SyntaxNode>) {
        self.pos += 1;
        if kind == TypeKind::Record && !self.eat_keyword(KeywordId::Class) {
            self.eat_keyword(KeywordId::Struct);
        }
        let Some(name) = self.eat_ident() else {
            return;
        };
        let mut children = Vec::new();
        if self.at_punct('<') {
            self.type_parameters(&mut children);
        }
        if kind == TypeKind::Record && self.at_punct('(') {
            self.parameters('(', ')', &mut children);
        }
        self.base_list(&mut children);
        self.where_clauses(&mut children);
        if self.eat_punct('{') {
            self.type_names.push(name.name());
            children.extend(self.members(true));
            self.type_names.pop();
            self.eat_punct('}');
        }
        self.eat_punct(';');
        out.push(
            SyntaxNode::new(NodeKind::TypeDeclaration(kind), self.span_from(start))
                .with_name(name.name(), name.span)
                .with_children(children),
        );
    }

    fn enum_declaration(&mut self, start: usize, out: &mut Vec<SyntaxNode>) {
        self.pos += 1;
        let Some(name) = self.eat_ident() else {
            return;
        };
        let mut children = Vec::new();
        self.base_list(&mut children);
        if self.eat_punct('{') {
            while let Some(tok) = self.peek() {
                if tok.kind == TokKind::Punct('}') {
                    break;
                }
                let before = self.pos;
                self.skip_attributes();
                if let Some(member) = self.eat_ident() {
                    let mut value = Vec::new();
                    if self.eat_punct('=') {
                        self.expr_run(&mut value, &[',', '}']);
                    }
                    children.push(
                        SyntaxNode::new(NodeKind::EnumMember, self.span_from(member.span.start))
                            .with_name(member.name(), member.span)
                            .with_children(value),
                    );
                }
                self.eat_punct(',');
                if self.pos == before {
                    self.pos += 1;
                }
            }
            self.eat_punct('}');
        }
        self.eat_punct(';');
        out.push(
            SyntaxNode::new(NodeKind::TypeDeclaration(TypeKind::Enum), self.span_from(start))
                .with_name(name.name(), name.span)
                .with_children(children),
        );
    }

    fn delegate_declaration(&mut self, start: usize, out: &mut Vec<SyntaxNode>) {
        self.pos += 1;
        let mut children = Vec::new();
        self.parse_type(&mut children);
        let Some(name) = self.eat_ident() else {
            return;
        };
        if self.at_punct('<') {
            self.type_parameters(&mut children);
        }
        if self.at_punct('(') {
            self.parameters('(', ')', &mut children);
        }
        self.where_clauses(&mut children);
        self.eat_punct(';');
        out.push(
            SyntaxNode::new(NodeKind::TypeDeclaration(TypeKind::Delegate), self.span_from(start))
                .with_name(name.name(), name.span)
                .with_children(children),
        );
    }

    fn event_declaration(&mut self, start: usize, out: &mut Vec<SyntaxNode>) {
        self.pos += 1;
        let mut types = Vec::new();
        self.parse_type(&mut types);
        let Some(name) = self.member_name(&mut types) else {
            return;
        };
        if self.at_punct('{') {
            let mut children = types;
            self.accessors(&mut children);
            out.push(
                SyntaxNode::new(NodeKind::Event, self.span_from(start))
                    .with_name(name.name(), name.span)
                    .with_children(children),
            );
            return;
        }
        self.declarators(NodeKind::Event, start, name, types, out);
    }

    /// Methods, constructors, operators, indexers, properties and fields.
    fn typed_member(&mut self, start: usize, out: &mut Vec<SyntaxNode>) {
        // Constructor and finalizer
        let finalizer = self.eat_punct('~');
        if self.at_ident() && self.punct_at(1, '(') {
            let is_ctor = self
                .peek()
                .is_some_and(|t| self.type_names.last() == Some(&t.name()));
            if is_ctor || finalizer {
                if let Some(name) = self.bump() {
                    self.method(start, NodeKind::Constructor, Some(name), Vec::new(), out);
                }
                return;
            }
        }

        // Conversion operators
        if self.at_keyword(KeywordId::Implicit) || self.at_keyword(KeywordId::Explicit) {
            self.pos += 1;
            self.eat_keyword(KeywordId::Operator);
            let mut types = Vec::new();
            self.parse_type(&mut types);
            self.method(start, NodeKind::Method, None, types, out);
            return;
        }

        let mut types = Vec::new();
        if !self.parse_type(&mut types) {
            self.pos += 1;
            return;
        }

        if self.eat_keyword(KeywordId::Operator) {
            while self.peek().is_some() && !self.at_punct('(') {
                self.pos += 1;
            }
            self.method(start, NodeKind::Method, None, types, out);
            return;
        }

        if self.at_keyword(KeywordId::This) && self.punct_at(1, '[') {
            self.pos += 1;
            let mut children = types;
            self.parameters('[', ']', &mut children);
            self.property_body(&mut children);
            out.push(SyntaxNode::new(NodeKind::Property, self.span_from(start)).with_children(children));
            return;
        }

        let Some(name) = self.member_name(&mut types) else {
            return;
        };
        if self.at_punct('(') || self.at_punct('<') {
            self.method(start, NodeKind::Method, Some(name), types, out);
        } else if self.at_punct('{') || self.arrow_at(0) {
            let mut children = types;
            self.property_body(&mut children);
            out.push(
                SyntaxNode::new(NodeKind::Property, self.span_from(start))
                    .with_name(name.name(), name.span)
                    .with_children(children),
            );
        } else {
            self.declarators(NodeKind::Field, start, name, types, out);
        }
    }

    /// Member name, with explicit interface qualifiers (`IFoo.Bar`) turned into type references.
    fn member_name(&mut self, types: &mut Vec<SyntaxNode>) -> Option<Tok<'s>> {
        let mut name = self.eat_ident()?;
        while self.punct_at(0, '.') && self.kind_at(1) == Some(TokKind::Ident) {
            types.push(SyntaxNode::reference(NodeKind::TypeReference, name.name(), name.span));
            self.pos += 1;
            name = self.bump()?;
        }
        Some(name)
    }

    /// One or more comma-separated field or event declarators, with optional initializers.
    ///
    /// The first declarator's span starts at `start` so it covers the shared type.
    fn declarators(
        &mut self,
        kind: NodeKind,
        start: usize,
        first: Tok<'s>,
        types: Vec<SyntaxNode>,
        out: &mut Vec<SyntaxNode>,
    ) {
        let mut name = first;
        let mut children = types;
        let mut from = start;
        loop {
            if self.eat_punct('=') {
                self.expr_run(&mut children, &[',', ';']);
            }
            out.push(
                SyntaxNode::new(kind, self.span_from(from))
                    .with_name(name.name(), name.span)
                    .with_children(std::mem::take(&mut children)),
            );
            if !self.eat_punct(',') {
                break;
            }
            match self.eat_ident() {
                Some(next) => {
                    from = next.span.start;
                    name = next;
                }
                None => break,
            }
        }
        self.eat_punct(';');
    }

    fn method(
        &mut self,
        start: usize,
        kind: NodeKind,
        name: Option<Tok<'s>>,
        types: Vec<SyntaxNode>,
        out: &mut Vec<SyntaxNode>,
    ) {
        let mut children = types;
        if self.at_punct('<') {
            self.type_parameters(&mut children);
        }
        if self.at_punct('(') {
            self.parameters('(', ')', &mut children);
        }
        if kind == NodeKind::Constructor && self.eat_punct(':') {
            self.pos += 1;
            if self.eat_punct('(') {
                self.expr_run(&mut children, &[')']);
                self.eat_punct(')');
            }
        }
        self.where_clauses(&mut children);
        self.body(&mut children);
        let mut node = SyntaxNode::new(kind, self.span_from(start));
        if let Some(name) = name {
            node = node.with_name(name.name(), name.span);
        }
        out.push(node.with_children(children));
    }

    /// Block body, expression body, or `;`.
    fn body(&mut self, children: &mut Vec<SyntaxNode>) {
        if self.at_punct('{') {
            children.push(self.block());
        } else if self.arrow_at(0) {
            self.pos += 2;
            self.expr_run(children, &[';']);
            self.eat_punct(';');
        } else {
            self.eat_punct(';');
        }
    }

    fn property_body(&mut self, children: &mut Vec<SyntaxNode>) {
        if self.at_punct('{') {
            self.accessors(children);
            if self.eat_punct('=') {
                self.expr_run(children, &[';']);
                self.eat_punct(';');
            }
        } else if self.arrow_at(0) {
            self.pos += 2;
            let outer = std::mem::replace(&mut self.in_accessor, true);
            self.expr_run(children, &[';']);
            self.in_accessor = outer;
            self.eat_punct(';');
        }
    }

    fn accessors(&mut self, children: &mut Vec<SyntaxNode>) {
        self.pos += 1;
        while let Some(tok) = self.peek() {
            if tok.kind == TokKind::Punct('}') {
                break;
            }
            let before = self.pos;
            self.skip_attributes();
            self.skip_modifiers();
            let start = self.start();
            if matches!(
                self.kind_at(0),
                Some(TokKind::Keyword(
                    KeywordId::Get | KeywordId::Set | KeywordId::Init | KeywordId::Add | KeywordId::Remove
                ))
            ) {
                self.pos += 1;
                let outer = std::mem::replace(&mut self.in_accessor, true);
                let mut body = Vec::new();
                self.body(&mut body);
                self.in_accessor = outer;
                children.push(SyntaxNode::new(NodeKind::Accessor, self.span_from(start)).with_children(body));
            }
            if self.pos == before {
                self.pos += 1;
            }
        }
        self.eat_punct('}');
    }

    fn type_parameters(&mut self, children: &mut Vec<SyntaxNode>) {
        self.pos += 1;
        while let Some(tok) = self.peek() {
            if tok.kind == TokKind::Punct('>') {
                break;
            }
            self.skip_attributes();
            if !self.eat_keyword(KeywordId::In) {
                self.eat_keyword(KeywordId::Out);
            }
            match self.eat_ident() {
                Some(name) => children.push(
                    SyntaxNode::new(NodeKind::TypeParameter, name.span).with_name(name.name(), name.span),
                ),
                None => {
                    if !self.at_punct(',') {
                        break;
                    }
                }
            }
            if !self.eat_punct(',') {
                break;
            }
        }
        self.eat_punct('>');
    }

    fn parameters(&mut self, open: char, close: char, children: &mut Vec<SyntaxNode>) {
        if !self.eat_punct(open) {
            return;
        }
        while let Some(tok) = self.peek() {
            if tok.kind == TokKind::Punct(close) {
                break;
            }
            let before = self.pos;
            self.skip_attributes();
            let start = self.start();
            while matches!(
                self.kind_at(0),
                Some(TokKind::Keyword(
                    KeywordId::Ref
                        | KeywordId::Out
                        | KeywordId::In
                        | KeywordId::Params
                        | KeywordId::This
                        | KeywordId::Readonly
                ))
            ) {
                self.pos += 1;
            }
            let mut param = Vec::new();
            self.parse_type(&mut param);
            if let Some(name) = self.eat_ident() {
                if self.eat_punct('=') {
                    self.expr_run(&mut param, &[',', close]);
                }
                children.push(
                    SyntaxNode::new(NodeKind::Parameter, self.span_from(start))
                        .with_name(name.name(), name.span)
                        .with_children(param),
                );
            } else {
                children.extend(param);
            }
            if !self.eat_punct(',') && self.pos == before {
                self.pos += 1;
            }
        }
        self.eat_punct(close);
    }

    fn base_list(&mut self, children: &mut Vec<SyntaxNode>) {
        if !self.eat_punct(':') {
            return;
        }
        loop {
            if !self.parse_type(children) {
                break;
            }
            if self.eat_punct('(') {
                self.expr_run(children, &[')']);
                self.eat_punct(')');
            }
            if !self.eat_punct(',') {
                break;
            }
        }
    }

    fn where_clauses(&mut self, children: &mut Vec<SyntaxNode>) {
        while self.eat_keyword(KeywordId::Where) {
            if let Some(name) = self.eat_ident() {
                children.push(SyntaxNode::reference(NodeKind::TypeReference, name.name(), name.span));
            }
            self.eat_punct(':');
            loop {
                if self.eat_keyword(KeywordId::Class) || self.eat_keyword(KeywordId::Struct) {
                    self.eat_punct('?');
                } else if self.at_keyword(KeywordId::New) && self.punct_at(1, '(') {
                    self.pos += 2;
                    self.eat_punct(')');
                } else if !self.parse_type(children) {
                    break;
                }
                if !self.eat_punct(',') {
                    break;
                }
            }
        }
    }

    // ========================================================================
    // Types
    // ========================================================================

    /// Parse a type, emitting type references. Consumes nothing and returns `false` when no type is here.
    fn parse_type(&mut self, out: &mut Vec<SyntaxNode>) -> bool {
        let save = self.pos;
        let mark = out.len();
        let found = self.type_inner(out);
        if !found {
            self.pos = save;
            out.truncate(mark);
        }
        found
    }

    fn type_inner(&mut self, out: &mut Vec<SyntaxNode>) -> bool {
        if !self.enter() {
            return false;
        }
        let found = self.type_shape(out);
        self.leave();
        found
    }

    fn type_shape(&mut self, out: &mut Vec<SyntaxNode>) -> bool {
        match self.kind_at(0) {
            Some(TokKind::Keyword(id)) if keywords::is_type_keyword(id) => self.pos += 1,
            Some(TokKind::Punct('(')) => {
                self.pos += 1;
                loop {
                    if !self.type_inner(out) {
                        return false;
                    }
                    self.eat_ident();
                    if !self.eat_punct(',') {
                        break;
                    }
                }
                if !self.eat_punct(')') {
                    return false;
                }
            }
            Some(TokKind::Ident) => loop {
                let Some(tok) = self.bump() else {
                    return false;
                };
                out.push(SyntaxNode::reference(NodeKind::TypeReference, tok.name(), tok.span));
                if self.at_punct('<') && !self.type_arguments(out) {
                    return false;
                }
                let qualified = (self.punct_at(0, '.') || self.punct_at(0, ':') && self.punct_at(1, ':'))
                    && self.kind_at(if self.at_punct('.') { 1 } else { 2 }) == Some(TokKind::Ident);
                if !qualified {
                    break;
                }
                self.pos += if self.at_punct('.') { 1 } else { 2 };
            },
            _ => return false,
        }

        // Nullable, array and pointer suffixes
        loop {
            if self.at_punct('?') && self.prev_end() == self.start() {
                self.pos += 1;
            } else if self.at_punct('[') && (self.punct_at(1, ']') || self.punct_at(1, ',')) {
                self.skip_balanced('[', ']');
            } else if self.at_punct('*') && self.prev_end() == self.start() {
                self.pos += 1;
            } else {
                break;
            }
        }
        true
    }

    fn type_arguments(&mut self, out: &mut Vec<SyntaxNode>) -> bool {
        self.pos += 1;
        loop {
            if self.at_punct('>') || self.at_punct(',') {
                // Unbound generic: `Foo<>` / `Foo<,>`
                if self.eat_punct(',') {
                    continue;
                }
                break;
            }
            if !self.type_inner(out) {
                return false;
            }
            if !self.eat_punct(',') {
                break;
            }
        }
        self.eat_punct('>')
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn block(&mut self) -> SyntaxNode {
        let start = self.start();
        if !self.enter() {
            self.skip_balanced('{', '}');
            return SyntaxNode::new(NodeKind::Block, self.span_from(start));
        }
        self.pos += 1;
        let mut children = Vec::new();
        while let Some(tok) = self.peek() {
            if tok.kind == TokKind::Punct('}') {
                break;
            }
            let before = self.pos;
            self.statement(&mut children);
            if self.pos == before {
                self.pos += 1;
            }
        }
        self.eat_punct('}');
        self.leave();
        SyntaxNode::new(NodeKind::Block, self.span_from(start)).with_children(children)
    }

    fn statement(&mut self, out: &mut Vec<SyntaxNode>) {
        let Some(tok) = self.peek() else {
            return;
        };
        if !self.enter() {
            if tok.kind == TokKind::Punct('{') {
                self.skip_balanced('{', '}');
            } else {
                self.skip_run(&[';']);
                self.eat_punct(';');
            }
            return;
        }
        match tok.kind {
            TokKind::Punct('{') => out.push(self.block()),
            TokKind::Punct(';') => self.pos += 1,
            TokKind::Keyword(
                KeywordId::If | KeywordId::While | KeywordId::Switch | KeywordId::Lock | KeywordId::Fixed,
            ) => {
                self.pos += 1;
                self.parenthesized(out);
                self.statement(out);
            }
            TokKind::Keyword(KeywordId::Using) if self.punct_at(1, '(') => {
                self.pos += 1;
                self.parenthesized(out);
                self.statement(out);
            }
            TokKind::Keyword(KeywordId::Using | KeywordId::Const) => {
                self.pos += 1;
                self.statement(out);
            }
            TokKind::Keyword(
                KeywordId::Else
                | KeywordId::Do
                | KeywordId::Try
                | KeywordId::Finally
                | KeywordId::Unsafe
                | KeywordId::Checked
                | KeywordId::Unchecked,
            ) if !self.punct_at(1, '(') => {
                self.pos += 1;
                self.statement(out);
            }
            TokKind::Keyword(KeywordId::Catch) => {
                self.pos += 1;
                if self.eat_punct('(') {
                    self.parse_type(out);
                    if let Some(name) = self.eat_ident() {
                        out.push(SyntaxNode::new(NodeKind::Local, name.span).with_name(name.name(), name.span));
                    }
                    self.eat_punct(')');
                }
                if self.at_ident_text("when") {
                    self.pos += 1;
                    self.parenthesized(out);
                }
                self.statement(out);
            }
            TokKind::Keyword(KeywordId::Foreach) => {
                self.pos += 1;
                if self.eat_punct('(') {
                    self.eat_keyword(KeywordId::Await);
                    self.parse_type(out);
                    self.local_names(out);
                    self.eat_keyword(KeywordId::In);
                    self.expr_run(out, &[')']);
                    self.eat_punct(')');
                }
                self.statement(out);
            }
            TokKind::Keyword(KeywordId::For) => {
                self.pos += 1;
                if self.eat_punct('(') {
                    if self.looks_like_local_decl() {
                        self.local_declaration(out, ';');
                    } else {
                        self.expr_run(out, &[';']);
                    }
                    self.eat_punct(';');
                    self.expr_run(out, &[';']);
                    self.eat_punct(';');
                    self.expr_run(out, &[')']);
                    self.eat_punct(')');
                }
                self.statement(out);
            }
            TokKind::Keyword(KeywordId::Case) => {
                self.pos += 1;
                self.expr_run(out, &[':']);
                self.eat_punct(':');
            }
            TokKind::Keyword(KeywordId::Default) if self.punct_at(1, ':') => self.pos += 2,
            TokKind::Keyword(KeywordId::Goto) => self.skip_past(';'),
            TokKind::Keyword(KeywordId::Yield) => {
                self.pos += 1;
                if !self.eat_keyword(KeywordId::Return) {
                    self.eat_keyword(KeywordId::Break);
                }
                self.expr_run(out, &[';']);
                self.eat_punct(';');
            }
            TokKind::Keyword(KeywordId::Return | KeywordId::Throw | KeywordId::Break | KeywordId::Continue) => {
                self.pos += 1;
                self.expr_run(out, &[';']);
                self.eat_punct(';');
            }
            // Label
            TokKind::Ident if self.punct_at(1, ':') && !self.punct_at(2, ':') => self.pos += 2,
            _ if self.looks_like_local_decl() => {
                self.local_declaration(out, ';');
                self.eat_punct(';');
            }
            _ if self.looks_like_local_function() => {
                let start = self.start();
                self.skip_modifiers();
                self.typed_member(start, out);
            }
            _ => {
                self.expr_run(out, &[';']);
                self.eat_punct(';');
            }
        }
        self.leave();
    }

    /// `( declaration-or-expression )`
    fn parenthesized(&mut self, out: &mut Vec<SyntaxNode>) {
        if !self.eat_punct('(') {
            return;
        }
        if self.looks_like_local_decl() {
            self.local_declaration(out, ')');
        } else {
            self.expr_run(out, &[')']);
        }
        self.eat_punct(')');
    }

    /// `Type name = init, name2 = init2` without the terminator.
    fn local_declaration(&mut self, out: &mut Vec<SyntaxNode>, terminator: char) {
        self.parse_type(out);
        while let Some(name) = self.eat_ident() {
            let mut init = Vec::new();
            if self.eat_punct('=') {
                self.expr_run(&mut init, &[',', terminator]);
            }
            out.push(
                SyntaxNode::new(NodeKind::Local, self.span_from(name.span.start))
                    .with_name(name.name(), name.span)
                    .with_children(init),
            );
            if !self.eat_punct(',') {
                break;
            }
        }
    }

    /// A local name, or a deconstruction `(a, b)`.
    fn local_names(&mut self, out: &mut Vec<SyntaxNode>) {
        if let Some(name) = self.eat_ident() {
            out.push(SyntaxNode::new(NodeKind::Local, name.span).with_name(name.name(), name.span));
        } else if self.eat_punct('(') {
            while let Some(name) = self.eat_ident() {
                out.push(SyntaxNode::new(NodeKind::Local, name.span).with_name(name.name(), name.span));
                if !self.eat_punct(',') {
                    break;
                }
            }
            self.eat_punct(')');
        }
    }

    fn looks_like_local_decl(&mut self) -> bool {
        self.lookahead(|p| {
            p.eat_keyword(KeywordId::Const);
            p.parse_type(&mut Vec::new())
                && p.at_ident()
                && matches!(p.kind_at(1), Some(TokKind::Punct('=' | ';' | ',')))
                && !p.arrow_at(1)
        })
    }

    fn looks_like_local_function(&mut self) -> bool {
        self.lookahead(|p| {
            p.skip_modifiers();
            p.parse_type(&mut Vec::new()) && p.at_ident() && (p.punct_at(1, '(') || p.punct_at(1, '<'))
        })
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Consume an expression token run up to a stop character at depth zero, or an unmatched closer.
    fn expr_run(&mut self, out: &mut Vec<SyntaxNode>, stops: &[char]) {
        if !self.enter() {
            self.skip_run(stops);
            return;
        }
        while let Some(tok) = self.peek() {
            match tok.kind {
                TokKind::Punct(c) if stops.contains(&c) => break,
                TokKind::Punct(')' | ']' | '}') => break,
                TokKind::Punct('(') => {
                    if let Some(params) = self.lambda_parameters() {
                        out.extend(params);
                        continue;
                    }
                    self.pos += 1;
                    self.expr_run(out, &[]);
                    self.eat_punct(')');
                }
                TokKind::Punct('[') => {
                    self.pos += 1;
                    self.expr_run(out, &[]);
                    self.eat_punct(']');
                }
                TokKind::Punct('{') => {
                    self.pos += 1;
                    self.expr_run(out, &[]);
                    self.eat_punct('}');
                }
                TokKind::Punct('=') if self.arrow_at(0) => {
                    self.pos += 2;
                    if self.at_punct('{') {
                        out.push(self.block());
                    }
                }
                TokKind::Punct('.') => {
                    self.pos += 1;
                    if let Some(member) = self.eat_ident() {
                        out.push(SyntaxNode::reference(NodeKind::MemberAccess, member.name(), member.span));
                        self.generic_arguments(out);
                    }
                }
                TokKind::Punct(_) | TokKind::Literal => self.pos += 1,
                TokKind::Keyword(KeywordId::New | KeywordId::Stackalloc) => {
                    self.pos += 1;
                    self.parse_type(out);
                }
                TokKind::Keyword(KeywordId::Typeof | KeywordId::Sizeof | KeywordId::Default)
                    if self.punct_at(1, '(') =>
                {
                    self.pos += 2;
                    if !self.parse_type(out) || !self.at_punct(')') {
                        self.expr_run(out, &[')']);
                    }
                    self.eat_punct(')');
                }
                TokKind::Keyword(KeywordId::Is | KeywordId::As) => {
                    self.pos += 1;
                    if self.at_ident_text("not") {
                        self.pos += 1;
                    }
                    if self.parse_type(out) && self.at_ident() && !self.punct_at(1, '(') {
                        self.local_names(out);
                    }
                }
                TokKind::Keyword(KeywordId::Out) => {
                    self.pos += 1;
                    let declares = self.lookahead(|p| p.parse_type(&mut Vec::new()) && p.at_ident());
                    if declares {
                        self.parse_type(out);
                        self.local_names(out);
                    }
                }
                TokKind::Keyword(KeywordId::Delegate) => {
                    self.pos += 1;
                    if self.at_punct('(') {
                        self.parameters('(', ')', out);
                    }
                    if self.at_punct('{') {
                        out.push(self.block());
                    }
                }
                TokKind::Keyword(_) => self.pos += 1,
                TokKind::Ident => self.identifier(out),
            }
        }
        self.leave();
    }

    fn identifier(&mut self, out: &mut Vec<SyntaxNode>) {
        let Some(tok) = self.bump() else {
            return;
        };
        let name = tok.name();
        if self.arrow_at(0) {
            out.push(SyntaxNode::new(NodeKind::Parameter, tok.span).with_name(name, tok.span));
            return;
        }
        if name == "_" || (name == "nameof" && self.at_punct('(')) {
            return;
        }
        if name == "var" && self.at_punct('(') {
            out.push(SyntaxNode::reference(NodeKind::TypeReference, name, tok.span));
            self.local_names(out);
            return;
        }
        if name == "value" && self.in_accessor {
            out.push(SyntaxNode::reference(NodeKind::ContextualKeyword, name, tok.span));
            return;
        }
        // Named argument
        let previous = self.pos.checked_sub(2).and_then(|i| self.toks.get(i)).map(|t| t.kind);
        if self.at_punct(':')
            && !self.punct_at(1, ':')
            && matches!(previous, Some(TokKind::Punct('(' | ',')))
        {
            return;
        }
        out.push(SyntaxNode::reference(NodeKind::IdentifierName, name, tok.span));
        self.generic_arguments(out);
    }

    /// Speculative `<T, U>` after a name in expression position.
    fn generic_arguments(&mut self, out: &mut Vec<SyntaxNode>) {
        if !self.at_punct('<') {
            return;
        }
        let save = self.pos;
        let mut args = Vec::new();
        let generic = self.type_arguments(&mut args)
            && matches!(
                self.kind_at(0),
                Some(TokKind::Punct('(' | ')' | ';' | ',' | '.')) | None
            );
        if generic {
            out.extend(args);
        } else {
            self.pos = save;
        }
    }

    /// `(a, b) =>` or `(int a, string b) =>`; consumes the parameter list (not the arrow) on success.
    fn lambda_parameters(&mut self) -> Option<Vec<SyntaxNode>> {
        let save = self.pos;
        self.pos += 1;
        let mut params = Vec::new();
        loop {
            if self.at_punct(')') {
                break;
            }
            while self.eat_keyword(KeywordId::Ref) || self.eat_keyword(KeywordId::Out) || self.eat_keyword(KeywordId::In)
            {
            }
            let start = self.start();
            let mut types = Vec::new();
            let untyped = self.at_ident() && (self.punct_at(1, ',') || self.punct_at(1, ')'));
            if !untyped && !self.parse_type(&mut types) {
                break;
            }
            let Some(name) = self.eat_ident() else {
                break;
            };
            params.push(
                SyntaxNode::new(NodeKind::Parameter, self.span_from(start))
                    .with_name(name.name(), name.span)
                    .with_children(types),
            );
            if !self.eat_punct(',') {
                break;
            }
        }
        if self.eat_punct(')') && self.arrow_at(0) {
            Some(params)
        } else {
            self.pos = save;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::WalkControl;

    fn parse(text: &str) -> SyntaxNode {
        parse_outline(text, &Grammar::csharp(), &DefinedSymbolSet::new())
    }

    /// `(kind, name)` for every named node, in pre-order.
    fn named(root: &SyntaxNode) -> Vec<(NodeKind, String)> {
        let mut out = Vec::new();
        root.walk(&mut |node| {
            if let Some(name) = node.name_text() {
                out.push((node.kind, name.to_string()));
            }
            WalkControl::Continue
        });
        out
    }

    fn names_of(root: &SyntaxNode, kind: NodeKind) -> Vec<String> {
        named(root)
            .into_iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, name)| name)
            .collect()
    }

    #[test]
    fn test_class_members() {
        let root = parse(
            "namespace Demo {\n\
             public class Counter<T> : Base, IDisposable {\n\
                 private int _count = 0, _max;\n\
                 public event EventHandler Changed;\n\
                 public int Count { get { return _count; } set { _count = value; } }\n\
                 public Counter(int start) : base(start) { _count = start; }\n\
                 public void Add(T item, int times = 1) { var total = _count + times; Log(total); }\n\
                 void IDisposable.Dispose() { }\n\
             }\n\
             }",
        );
        assert_eq!(names_of(&root, NodeKind::TypeDeclaration(TypeKind::Class)), vec!["Counter"]);
        assert_eq!(names_of(&root, NodeKind::TypeParameter), vec!["T"]);
        assert_eq!(names_of(&root, NodeKind::Field), vec!["_count", "_max"]);
        assert_eq!(names_of(&root, NodeKind::Event), vec!["Changed"]);
        assert_eq!(names_of(&root, NodeKind::Property), vec!["Count"]);
        assert_eq!(names_of(&root, NodeKind::Constructor), vec!["Counter"]);
        assert_eq!(names_of(&root, NodeKind::Method), vec!["Add", "Dispose"]);
        assert_eq!(names_of(&root, NodeKind::Parameter), vec!["start", "item", "times"]);
        assert_eq!(names_of(&root, NodeKind::Local), vec!["total"]);
        assert_eq!(names_of(&root, NodeKind::ContextualKeyword), vec!["value"]);
        assert_eq!(
            names_of(&root, NodeKind::TypeReference),
            vec!["Base", "IDisposable", "EventHandler", "T", "var", "IDisposable"]
        );
        assert_eq!(
            names_of(&root, NodeKind::IdentifierName),
            vec!["_count", "_count", "start", "_count", "start", "_count", "times", "Log", "total"]
        );
    }

    #[test]
    fn test_value_outside_accessor_is_a_name() {
        let root = parse("class A { void M(int value) { Use(value); } }");
        assert!(names_of(&root, NodeKind::ContextualKeyword).is_empty());
        assert_eq!(names_of(&root, NodeKind::IdentifierName), vec!["Use", "value"]);
    }

    #[test]
    fn test_statements_declare_locals() {
        let root = parse(
            "class A { void M(string[] items) {\n\
                 foreach (var item in items) { Print(item); }\n\
                 for (int i = 0; i < 3; i++) { }\n\
                 try { } catch (Exception ex) { Print(ex); }\n\
                 if (items is string[] arr) { }\n\
                 Parse(out var parsed);\n\
                 Action<int> f = x => Print(x);\n\
             } }",
        );
        assert_eq!(names_of(&root, NodeKind::Local), vec!["item", "i", "ex", "arr", "parsed", "f"]);
        assert_eq!(names_of(&root, NodeKind::Parameter), vec!["items", "x"]);
        assert!(names_of(&root, NodeKind::IdentifierName).contains(&"Print".to_string()));
    }

    #[test]
    fn test_member_access_and_generics() {
        let root = parse("class A { void M() { var list = new List<int>(); list.Add(Convert<int>(1)); if (a < b) { } } }");
        assert_eq!(names_of(&root, NodeKind::MemberAccess), vec!["Add"]);
        assert_eq!(names_of(&root, NodeKind::IdentifierName), vec!["list", "Convert", "a", "b"]);
        assert_eq!(names_of(&root, NodeKind::TypeReference), vec!["var", "List"]);
    }

    #[test]
    fn test_enum_and_delegate() {
        let root = parse("enum Color : byte { Red, Green = 2 }\ndelegate void Handler(object sender);");
        assert_eq!(names_of(&root, NodeKind::EnumMember), vec!["Red", "Green"]);
        assert_eq!(
            names_of(&root, NodeKind::TypeDeclaration(TypeKind::Delegate)),
            vec!["Handler"]
        );
        assert_eq!(names_of(&root, NodeKind::Parameter), vec!["sender"]);
    }

    #[test]
    fn test_excluded_code_is_skipped() {
        let text = "class A {\n#if DEBUG\nint debugOnly;\n#else\nint release;\n#endif\n}";
        let root = parse(text);
        assert_eq!(names_of(&root, NodeKind::Field), vec!["release"]);

        let defines: DefinedSymbolSet = ["DEBUG"].into_iter().collect();
        let root = parse_outline(text, &Grammar::csharp(), &defines);
        assert_eq!(names_of(&root, NodeKind::Field), vec!["debugOnly"]);
    }

    /// Parse on a thread with the stack size of a runtime blocking-pool thread.
    fn parse_on_small_stack(text: String) -> SyntaxNode {
        std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || parse(&text))
            .unwrap()
            .join()
            .unwrap()
    }

    #[test]
    fn test_deep_braces_are_capped() {
        let text = format!("class A {{ void M() {{ {} }} }}", "{".repeat(200_000));
        let root = parse_on_small_stack(text);
        assert!(root.depth() <= MAX_NESTING + 8, "depth {}", root.depth());
        assert_eq!(names_of(&root, NodeKind::Method), vec!["M"]);
    }

    #[test]
    fn test_deep_expressions_keep_later_members() {
        let depth = 100_000;
        let text = format!(
            "class A {{ void M() {{ x = {}1{}; }} int after; }}",
            "(".repeat(depth),
            ")".repeat(depth)
        );
        let root = parse_on_small_stack(text);
        assert_eq!(names_of(&root, NodeKind::Field), vec!["after"]);
        assert_eq!(names_of(&root, NodeKind::IdentifierName), vec!["x"]);
    }

    #[test]
    fn test_long_else_if_chain_is_capped() {
        let text = format!(
            "class A {{ void M() {{ if (a) {{ }}{} }} int after; }}",
            " else if (a) { }".repeat(50_000)
        );
        let root = parse_on_small_stack(text);
        assert!(root.depth() <= MAX_NESTING + 8, "depth {}", root.depth());
        assert_eq!(names_of(&root, NodeKind::Field), vec!["after"]);
    }

    #[test]
    fn test_garbage_terminates() {
        for text in ["class", "class A {", "{{{{", ")))", "void M(", "a => => b", "int x = ;", "class A { int this[ }"] {
            let root = parse(text);
            assert_eq!(root.kind, NodeKind::CompilationUnit);
        }
    }
}

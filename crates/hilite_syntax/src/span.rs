//! The span stack and the preprocessor state machine.
//!
//! The scanner keeps one [`SpanStack`] per scan position: multi-line lexical spans (block comments, verbatim
//! strings) and preprocessor records (conditional blocks, `#define` / `#undef`). Every entry is a small value;
//! nothing points at anything else. Questions such as "is this position excluded" or "which symbols are defined
//! here" are answered by walking the stack.
//!
//! ## Notes
//! - A conditional chain (`#if` … `#elif` … `#else` … `#endif`) lives on the stack as consecutive conditional
//!   entries, possibly interleaved with symbol records. `#endif` removes the whole chain.
//! - Symbol records survive the removal of the chain they were written in: once defined, a symbol stays defined
//!   for the rest of the document unless `#undef` removes it.
//!
//! ## Examples
//! ```rust
//! use hilite_syntax::span::SpanStack;
//!
//! let mut stack = SpanStack::new();
//! stack.scan_if(false);
//! assert!(stack.excluded());
//! stack.scan_else();
//! assert!(!stack.excluded());
//! stack.scan_endif();
//! assert!(stack.is_empty());
//! ```

use hilite_core::lang::styles::StyleTag;

use crate::defines::DefinedSymbolSet;

/// Lexical rule in effect for a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Root,
    Comment,
    String,
    PreProcessor,
    /// Code inside an excluded conditional branch; painted as a whole, never tokenized.
    PreProcessorComment,
}

impl Rule {
    /// Whether the semantic overlay must leave chunks in this rule alone.
    pub fn is_comment_like(self) -> bool {
        matches!(self, Rule::Comment | Rule::PreProcessorComment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionalKind {
    If,
    ElseIf,
    Else,
}

/// One branch of a conditional block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConditionalSpan {
    pub kind: ConditionalKind,
    /// Whether this branch's own condition selected it.
    pub is_valid: bool,
    /// Whether an enclosing branch is excluded.
    pub disabled: bool,
}

impl ConditionalSpan {
    pub fn new(kind: ConditionalKind, is_valid: bool, disabled: bool) -> Self {
        Self {
            kind,
            is_valid,
            disabled,
        }
    }

    pub fn is_excluded(&self) -> bool {
        self.disabled || !self.is_valid
    }

    pub fn style(&self) -> StyleTag {
        if self.is_excluded() {
            StyleTag::ExcludedCode
        } else {
            StyleTag::PlainText
        }
    }

    pub fn rule(&self) -> Rule {
        if self.is_excluded() {
            Rule::PreProcessorComment
        } else {
            Rule::Root
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SpanEntry {
    BlockComment,
    VerbatimString,
    Conditional(ConditionalSpan),
    Define(String),
    Undef(String),
}

impl SpanEntry {
    fn is_symbol_record(&self) -> bool {
        matches!(self, SpanEntry::Define(_) | SpanEntry::Undef(_))
    }

    fn as_conditional(&self) -> Option<&ConditionalSpan> {
        match self {
            SpanEntry::Conditional(span) => Some(span),
            _ => None,
        }
    }
}

/// Stack of open spans, bottom first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SpanStack {
    entries: Vec<SpanEntry>,
}

impl SpanStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: SpanEntry) {
        self.entries.push(entry);
    }

    pub fn pop(&mut self) -> Option<SpanEntry> {
        self.entries.pop()
    }

    pub fn top(&self) -> Option<&SpanEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SpanEntry] {
        &self.entries
    }

    /// Conditional entries from the innermost outward, with their stack index.
    fn conditionals_outward(&self) -> impl Iterator<Item = (usize, &ConditionalSpan)> {
        self.entries
            .iter()
            .enumerate()
            .rev()
            .filter_map(|(index, entry)| entry.as_conditional().map(|span| (index, span)))
    }

    /// Innermost open conditional branch.
    pub fn innermost_conditional(&self) -> Option<&ConditionalSpan> {
        self.conditionals_outward().next().map(|(_, span)| span)
    }

    /// Whether code at this position is inside an excluded branch.
    pub fn excluded(&self) -> bool {
        self.innermost_conditional().is_some_and(ConditionalSpan::is_excluded)
    }

    /// Rule for ordinary code at this position.
    pub fn code_rule(&self) -> Rule {
        self.innermost_conditional().map_or(Rule::Root, ConditionalSpan::rule)
    }

    fn has_open(&self, kinds: &[ConditionalKind]) -> bool {
        self.conditionals_outward().any(|(_, span)| kinds.contains(&span.kind))
    }

    /// Symbols defined at this position: `base` plus the `#define`/`#undef` records on the stack, in order.
    pub fn defined_symbols(&self, base: &DefinedSymbolSet) -> DefinedSymbolSet {
        let mut symbols = base.clone();
        for entry in &self.entries {
            match entry {
                SpanEntry::Define(name) => {
                    symbols.insert(name.clone());
                }
                SpanEntry::Undef(name) => {
                    symbols.remove(name);
                }
                _ => {}
            }
        }
        symbols
    }

    // ========================================================================
    // Directives
    // ========================================================================

    /// Whether any open chain started with an `#if` whose own condition failed.
    fn inside_failed_if(&self) -> bool {
        self.conditionals_outward()
            .any(|(_, span)| span.kind == ConditionalKind::If && !span.is_valid)
    }

    /// `#define NAME`; ignored while any open `#if` evaluated false, even in a taken `#elif` of that chain.
    /// Returns whether the record was pushed.
    pub fn scan_define(&mut self, name: &str) -> bool {
        if self.inside_failed_if() || name.is_empty() {
            return false;
        }
        self.entries.push(SpanEntry::Define(name.to_string()));
        true
    }

    /// `#undef NAME`; same precondition as `#define`.
    pub fn scan_undef(&mut self, name: &str) -> bool {
        if self.inside_failed_if() || name.is_empty() {
            return false;
        }
        self.entries.push(SpanEntry::Undef(name.to_string()));
        true
    }

    /// `#if`: opens a chain. `value` is the condition evaluated at this position.
    pub fn scan_if(&mut self, value: bool) -> ConditionalSpan {
        let span = match self.innermost_conditional() {
            Some(parent) => ConditionalSpan::new(
                ConditionalKind::If,
                value && parent.is_valid,
                parent.disabled || !parent.is_valid,
            ),
            None => ConditionalSpan::new(ConditionalKind::If, value, false),
        };
        self.entries.push(SpanEntry::Conditional(span));
        span
    }

    /// OR of the branch validities in the innermost chain, and the index of the chain's `If`.
    fn chain_state(&self) -> Option<(bool, usize)> {
        let mut previous = false;
        for (index, span) in self.conditionals_outward() {
            previous |= span.is_valid;
            if span.kind == ConditionalKind::If {
                return Some((previous, index));
            }
        }
        None
    }

    /// `#elif`: continues the innermost chain.
    ///
    /// `value` is only evaluated when no earlier branch of the chain was taken. Returns `None` (and leaves the stack
    /// untouched) when no `#if` is open.
    pub fn scan_elif(&mut self, value: impl FnOnce() -> bool) -> Option<ConditionalSpan> {
        if !self.has_open(&[ConditionalKind::If]) {
            return None;
        }
        let (previous, if_index) = self.chain_state()?;
        let disabled = self.entries[if_index].as_conditional().is_some_and(|span| span.disabled);
        let is_valid = !previous && value();
        let span = ConditionalSpan::new(ConditionalKind::ElseIf, is_valid, disabled);
        self.entries.push(SpanEntry::Conditional(span));
        Some(span)
    }

    /// `#else`: closes the open branches of the innermost chain back to its `If` and opens the final branch.
    ///
    /// Returns `None` when neither `#if` nor `#elif` is open.
    pub fn scan_else(&mut self) -> Option<ConditionalSpan> {
        if !self.has_open(&[ConditionalKind::If, ConditionalKind::ElseIf]) {
            return None;
        }
        let (previous, if_index) = self.chain_state()?;
        let disabled = self.entries[if_index].as_conditional().is_some_and(|span| span.disabled);
        self.truncate_keeping_symbols(if_index + 1);
        let span = ConditionalSpan::new(ConditionalKind::Else, !previous, disabled);
        self.entries.push(SpanEntry::Conditional(span));
        Some(span)
    }

    /// `#endif`: removes the innermost chain. Returns the branch that was open, or `None` if nothing was.
    pub fn scan_endif(&mut self) -> Option<ConditionalSpan> {
        let closed = *self.innermost_conditional()?;
        let (_, if_index) = self.chain_state()?;
        self.truncate_keeping_symbols(if_index);
        Some(closed)
    }

    /// Drop entries from `index` upward, except symbol records, which move down.
    fn truncate_keeping_symbols(&mut self, index: usize) {
        let kept: Vec<SpanEntry> = self
            .entries
            .drain(index..)
            .filter(SpanEntry::is_symbol_record)
            .collect();
        self.entries.extend(kept);
    }
}

//! Property-based tests for the engine
//!
//! These use proptest to check invariants of the condition evaluator, the segment index and chunk splitting.

use hilite::render::{ChunkRenderer, StyledChunk};
use hilite::semantic::{SemanticModel, SymbolInfo};
use hilite::{LineSegments, SegmentIndex};
use hilite_core::lang::styles::StyleTag;
use hilite_syntax::ast::Span;
use hilite_syntax::eval::evaluate_text;
use hilite_syntax::expr::parse_condition;
use hilite_syntax::{Chunk, DefinedSymbolSet, NodeKind, Rule, SyntaxNode, TokenClass};
use proptest::prelude::*;

// =============================================================================
// Conditional evaluator
// =============================================================================

const CONDITION_TOKENS: &[&str] = &[
    "A", "B", "C", "true", "false", "!", "&&", "||", "==", "!=", "(", ")", "<", "1", "\"s\"",
];

/// Token soup; mostly malformed.
fn token_soup() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(CONDITION_TOKENS), 0..12).prop_map(|tokens| tokens.join(" "))
}

/// Well-formed conditions.
fn condition() -> impl Strategy<Value = String> {
    let leaf = prop::sample::select(&["A", "B", "C", "true", "false", "1"][..]).prop_map(String::from);
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|e| format!("!{e}")),
            inner.clone().prop_map(|e| format!("({e})")),
            (inner.clone(), prop::sample::select(&["&&", "||", "==", "!=", "<"][..]), inner)
                .prop_map(|(l, op, r)| format!("{l} {op} {r}")),
        ]
    })
}

fn symbols() -> impl Strategy<Value = DefinedSymbolSet> {
    prop::sample::subsequence(vec!["A", "B", "C"], 0..=3).prop_map(|names| names.into_iter().collect())
}

proptest! {
    /// Any text evaluates to a value; nothing panics.
    #[test]
    fn evaluator_is_total(text in "\\PC{0,24}", defined in symbols()) {
        let _ = evaluate_text(&text, &defined);
    }

    /// Negating a well-formed condition negates its value.
    #[test]
    fn negation_inverts_parsed_conditions(text in condition(), defined in symbols()) {
        prop_assert!(parse_condition(&text).is_ok(), "{} should parse", text);
        let negated = format!("!({text})");
        prop_assert_eq!(evaluate_text(&negated, &defined), !evaluate_text(&text, &defined));
    }

    /// Unparseable text is false.
    #[test]
    fn unparseable_is_false(text in token_soup(), defined in symbols()) {
        prop_assume!(parse_condition(&text).is_err());
        prop_assert!(!evaluate_text(&text, &defined));
    }
}

// =============================================================================
// Segment index
// =============================================================================

const STYLES: &[StyleTag] = &[
    StyleTag::UserTypes,
    StyleTag::MethodUsage,
    StyleTag::FieldUsage,
    StyleTag::VariableDeclaration,
];

/// Non-overlapping segments from `(gap, length, style)` triples.
fn segments() -> impl Strategy<Value = Vec<(usize, usize, StyleTag)>> {
    prop::collection::vec((0usize..5, 1usize..6, prop::sample::select(STYLES)), 0..10).prop_map(|parts| {
        let mut pos = 0;
        parts
            .into_iter()
            .map(|(gap, len, style)| {
                let start = pos + gap;
                pos = start + len;
                (start, start + len, style)
            })
            .collect()
    })
}

proptest! {
    /// Covered offsets find exactly their segment; uncovered offsets find nothing.
    #[test]
    fn one_segment_per_offset(segments in segments()) {
        let mut index = SegmentIndex::new();
        for &(start, end, style) in &segments {
            prop_assert!(index.insert(start, end, style));
        }
        let limit = segments.last().map_or(0, |s| s.1) + 3;
        for offset in 0..limit {
            let covering: Vec<_> = segments.iter().filter(|s| s.0 <= offset && offset < s.1).collect();
            match index.query(offset) {
                Some(found) => {
                    prop_assert_eq!(covering.len(), 1);
                    prop_assert_eq!((found.start, found.end, found.style), *covering[0]);
                }
                None => prop_assert!(covering.is_empty()),
            }
        }
    }

    /// `invalidate(); insert(x); query(x) == None`
    #[test]
    fn dirty_index_drops_inserts(start in 0usize..100, len in 1usize..10, style in prop::sample::select(STYLES)) {
        let mut index = SegmentIndex::new();
        index.invalidate();
        prop_assert!(!index.insert(start, start + len, style));
        prop_assert_eq!(index.query(start), None);
        prop_assert!(index.is_empty());
    }
}

// =============================================================================
// Chunk splitting
// =============================================================================

struct NoSymbols(SyntaxNode);

impl SemanticModel for NoSymbols {
    fn syntax_root(&self) -> &SyntaxNode {
        &self.0
    }

    fn symbol_info(&self, _node: &SyntaxNode) -> Option<SymbolInfo> {
        None
    }
}

proptest! {
    /// A segment starting at the chunk start styles `min(segment, chunk)` bytes; the rest stays lexical.
    #[test]
    fn split_chunks_tile_the_original(chunk_len in 1usize..20, segment_len in 1usize..30) {
        let model = NoSymbols(SyntaxNode::new(NodeKind::CompilationUnit, Span::new(0, 30)));
        let mut lines = LineSegments::new();
        lines.get_or_build(0, || {
            let mut index = SegmentIndex::new();
            index.insert(0, segment_len, StyleTag::UserTypes);
            index
        });
        let chunk = Chunk::new(0, chunk_len, StyleTag::PlainText, Rule::Root, TokenClass::Identifier);
        let out = ChunkRenderer::new(Some(&model), &mut lines).render_line(0, Span::new(0, 30), &[chunk]);

        let styled = segment_len.min(chunk_len);
        prop_assert_eq!(out[0], StyledChunk::new(0, styled, StyleTag::UserTypes));
        if segment_len < chunk_len {
            prop_assert_eq!(out.len(), 2);
            prop_assert_eq!(out[1], StyledChunk::new(segment_len, chunk_len - segment_len, StyleTag::PlainText));
        } else {
            prop_assert_eq!(out.len(), 1);
        }
    }
}

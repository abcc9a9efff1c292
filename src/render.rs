//! Chunk renderer: merges lexical chunks with the semantic overlay.
//!
//! Comments and excluded code always keep their lexical style. Everything else is checked against the line's
//! [`SegmentIndex`], built on first use from the current model. With no model, or with semantic highlighting
//! off, chunks pass through untouched.

use hilite_core::lang::styles::StyleTag;
use hilite_syntax::Chunk;
use hilite_syntax::ast::Span;

use crate::segment_index::{LineSegments, SegmentIndex};
use crate::semantic::{SemanticModel, build_line_overlay};

/// A chunk after semantic styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyledChunk {
    pub offset: usize,
    pub length: usize,
    pub style: StyleTag,
}

impl StyledChunk {
    pub fn new(offset: usize, length: usize, style: StyleTag) -> Self {
        Self { offset, length, style }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

impl From<&Chunk> for StyledChunk {
    fn from(chunk: &Chunk) -> Self {
        Self::new(chunk.offset, chunk.length, chunk.style)
    }
}

pub struct ChunkRenderer<'a> {
    model: Option<&'a dyn SemanticModel>,
    segments: &'a mut LineSegments,
}

impl<'a> ChunkRenderer<'a> {
    /// `model` is `None` when there is nothing to overlay (no model yet, or semantic highlighting off).
    pub fn new(model: Option<&'a dyn SemanticModel>, segments: &'a mut LineSegments) -> Self {
        Self { model, segments }
    }

    /// Style every chunk of `line`, splitting chunks whose prefix is covered by a shorter segment.
    pub fn render_line(&mut self, line: usize, line_span: Span, chunks: &[Chunk]) -> Vec<StyledChunk> {
        let mut out = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            match self.segment_for(line, line_span, chunk) {
                Some((end, style)) if end < chunk.end() => {
                    out.push(StyledChunk::new(chunk.offset, end - chunk.offset, style));
                    out.push(StyledChunk::new(end, chunk.end() - end, chunk.style));
                }
                Some((_, style)) => out.push(StyledChunk::new(chunk.offset, chunk.length, style)),
                None => out.push(StyledChunk::from(chunk)),
            }
        }
        out
    }

    /// Style at the start of `chunk`.
    pub fn style_for(&mut self, line: usize, line_span: Span, chunk: &Chunk) -> StyleTag {
        self.segment_for(line, line_span, chunk)
            .map_or(chunk.style, |(_, style)| style)
    }

    /// End offset and style of the segment covering the chunk start, if the overlay applies.
    fn segment_for(&mut self, line: usize, line_span: Span, chunk: &Chunk) -> Option<(usize, StyleTag)> {
        let model = self.model?;
        if chunk.rule.is_comment_like() || chunk.length == 0 {
            return None;
        }
        let index = self
            .segments
            .get_or_build(line, || build_line_overlay(model, line_span));
        lookup(index, line, chunk)
    }
}

fn lookup(index: &SegmentIndex, line: usize, chunk: &Chunk) -> Option<(usize, StyleTag)> {
    if index.is_dirty() {
        tracing::warn!(line, "segment index invalidated during render, using lexical style");
        return None;
    }
    let segment = index.query(chunk.offset)?;
    if segment.end <= chunk.offset {
        tracing::warn!(line, offset = chunk.offset, "segment does not cover chunk, using lexical style");
        return None;
    }
    Some((segment.end.min(chunk.end()), segment.style))
}

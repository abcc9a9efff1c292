//! Per-document lexical highlighting state.
//!
//! [`DocumentHighlighter`] owns a document's text and the scanner state at the start of every line. Edits rescan
//! from the first touched line and stop as soon as the span stack at a line start matches what was stored before
//! the edit; everything after that point is reused with shifted offsets.

use std::ops::Range;
use std::sync::Arc;

use thiserror::Error;

use crate::ast::Span;
use crate::defines::DefinedSymbolSet;
use crate::diagnostics::CompileError;
use crate::grammar::Grammar;
use crate::scanner::{Chunk, LineScanner, ScanOptions, ScannedLine};
use crate::span::SpanStack;

/// Which lines changed as a result of an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirtyLines {
    /// Nothing changed.
    None,
    Single(usize),
    /// Lines `[from, to)`.
    Range { from: usize, to: usize },
    /// The line and everything after it (line count changed, or a full rebuild).
    FromLineToEnd(usize),
}

impl DirtyLines {
    pub fn is_none(&self) -> bool {
        matches!(self, DirtyLines::None)
    }

    pub fn start_line(&self) -> Option<usize> {
        match self {
            DirtyLines::None => None,
            DirtyLines::Single(line) | DirtyLines::FromLineToEnd(line) => Some(*line),
            DirtyLines::Range { from, .. } => Some(*from),
        }
    }

    /// Whether `line` is inside the dirty region.
    pub fn contains(&self, line: usize) -> bool {
        match self {
            DirtyLines::None => false,
            DirtyLines::Single(l) => *l == line,
            DirtyLines::Range { from, to } => (*from..*to).contains(&line),
            DirtyLines::FromLineToEnd(from) => line >= *from,
        }
    }

    /// Grow this region to cover `other` as well.
    pub fn merge(&mut self, other: DirtyLines) {
        *self = match (&*self, other) {
            (DirtyLines::None, other) => other,
            (_, DirtyLines::None) => return,
            (DirtyLines::FromLineToEnd(a), other) => {
                DirtyLines::FromLineToEnd(other.start_line().map_or(*a, |b| b.min(*a)))
            }
            (mine, DirtyLines::FromLineToEnd(b)) => {
                DirtyLines::FromLineToEnd(mine.start_line().map_or(b, |a| a.min(b)))
            }
            (mine, other) => {
                let (a_from, a_to) = mine.bounds();
                let (b_from, b_to) = other.bounds();
                let (from, to) = (a_from.min(b_from), a_to.max(b_to));
                if to == from + 1 {
                    DirtyLines::Single(from)
                } else {
                    DirtyLines::Range { from, to }
                }
            }
        };
    }

    /// Half-open bounds of a `Single` or `Range`.
    fn bounds(&self) -> (usize, usize) {
        match self {
            DirtyLines::Single(line) => (*line, *line + 1),
            DirtyLines::Range { from, to } => (*from, *to),
            DirtyLines::None => (0, 0),
            DirtyLines::FromLineToEnd(line) => (*line, usize::MAX),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("edit range {start}..{end} is out of bounds for a document of {len} bytes")]
    OutOfBounds { start: usize, end: usize, len: usize },
    #[error("edit offset {offset} is not on a character boundary")]
    NotCharBoundary { offset: usize },
}

#[derive(Debug, Clone)]
struct LineState {
    /// Span stack in effect at the start of the line.
    start: SpanStack,
    scanned: ScannedLine,
}

/// Start offset of every line; there is always at least one line.
pub fn build_line_offsets(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(idx, _)| idx + 1))
        .collect()
}

/// Lexical highlighting for one document.
#[derive(Debug, Clone)]
pub struct DocumentHighlighter {
    grammar: Arc<Grammar>,
    options: ScanOptions,
    symbols: DefinedSymbolSet,
    text: String,
    line_offsets: Vec<usize>,
    lines: Vec<LineState>,
}

impl DocumentHighlighter {
    pub fn new(
        grammar: Arc<Grammar>,
        options: ScanOptions,
        symbols: DefinedSymbolSet,
        text: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let mut highlighter = Self {
            grammar,
            options,
            symbols,
            line_offsets: build_line_offsets(&text),
            text,
            lines: Vec::new(),
        };
        highlighter.rebuild();
        highlighter
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_offsets.len()
    }

    pub fn scan_options(&self) -> &ScanOptions {
        &self.options
    }

    pub fn defined_symbols(&self) -> &DefinedSymbolSet {
        &self.symbols
    }

    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }

    /// Byte span of a line, without its `\n`.
    pub fn line_span(&self, line: usize) -> Option<Span> {
        let start = *self.line_offsets.get(line)?;
        let end = match self.line_offsets.get(line + 1) {
            Some(next) => next - 1,
            None => self.text.len(),
        };
        Some(Span::new(start, end))
    }

    pub fn line_text(&self, line: usize) -> Option<&str> {
        let span = self.line_span(line)?;
        self.text.get(span.start..span.end)
    }

    /// Line containing `offset`; offsets past the end map to the last line.
    pub fn line_at_offset(&self, offset: usize) -> usize {
        match self.line_offsets.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next.saturating_sub(1),
        }
    }

    /// Lexical chunks of a line, with document offsets.
    pub fn line_chunks(&self, line: usize) -> Option<&[Chunk]> {
        self.lines.get(line).map(|state| state.scanned.chunks.as_slice())
    }

    /// Span stack at the start of a line.
    pub fn line_start_stack(&self, line: usize) -> Option<&SpanStack> {
        self.lines.get(line).map(|state| &state.start)
    }

    /// Directive diagnostics across the document, in line order.
    pub fn diagnostics(&self) -> impl Iterator<Item = &CompileError> {
        self.lines.iter().flat_map(|state| state.scanned.diagnostics.iter())
    }

    /// Rescan every line.
    #[tracing::instrument(skip_all, fields(lines = self.line_offsets.len()))]
    pub fn rebuild(&mut self) -> DirtyLines {
        let mut stack = SpanStack::new();
        let mut lines = Vec::with_capacity(self.line_offsets.len());
        for line in 0..self.line_offsets.len() {
            let start = stack.clone();
            let scanned = self.scan(line, &mut stack);
            lines.push(LineState { start, scanned });
        }
        self.lines = lines;
        DirtyLines::FromLineToEnd(0)
    }

    pub fn set_defined_symbols(&mut self, symbols: DefinedSymbolSet) -> DirtyLines {
        self.symbols = symbols;
        self.rebuild()
    }

    pub fn set_scan_options(&mut self, options: ScanOptions) -> DirtyLines {
        self.options = options;
        self.rebuild()
    }

    /// Replace `range` with `replacement` and rescan what the edit can affect.
    pub fn edit(&mut self, range: Range<usize>, replacement: &str) -> Result<DirtyLines, EditError> {
        self.check_range(&range)?;
        if range.is_empty() && replacement.is_empty() {
            return Ok(DirtyLines::None);
        }

        let first_line = self.line_at_offset(range.start);
        let old_last_line = self.line_at_offset(range.end);
        let old_line_count = self.line_offsets.len();
        let delta = replacement.len() as isize - range.len() as isize;

        self.text.replace_range(range.clone(), replacement);
        self.line_offsets = build_line_offsets(&self.text);
        let new_last_line = self.line_at_offset(range.start + replacement.len());

        let tail = self.lines.split_off(old_last_line + 1);
        let mut stack = self.lines.get(first_line).map(|state| state.start.clone()).unwrap_or_default();
        self.lines.truncate(first_line);

        for line in first_line..=new_last_line {
            let start = stack.clone();
            let scanned = self.scan(line, &mut stack);
            self.lines.push(LineState { start, scanned });
        }

        let mut last_rescanned = new_last_line;
        let mut converged = false;
        for mut state in tail {
            let line = self.lines.len();
            converged = converged || state.start == stack;
            if converged {
                state.scanned.shift(delta);
                self.lines.push(state);
            } else {
                let start = stack.clone();
                let scanned = self.scan(line, &mut stack);
                self.lines.push(LineState { start, scanned });
                last_rescanned = line;
            }
        }
        tracing::debug!(first_line, last_rescanned, converged, "incremental rescan");

        Ok(if self.line_offsets.len() != old_line_count {
            DirtyLines::FromLineToEnd(first_line)
        } else if last_rescanned == first_line {
            DirtyLines::Single(first_line)
        } else {
            DirtyLines::Range {
                from: first_line,
                to: last_rescanned + 1,
            }
        })
    }

    fn check_range(&self, range: &Range<usize>) -> Result<(), EditError> {
        if range.start > range.end || range.end > self.text.len() {
            return Err(EditError::OutOfBounds {
                start: range.start,
                end: range.end,
                len: self.text.len(),
            });
        }
        for offset in [range.start, range.end] {
            if !self.text.is_char_boundary(offset) {
                return Err(EditError::NotCharBoundary { offset });
            }
        }
        Ok(())
    }

    fn scan(&self, line: usize, stack: &mut SpanStack) -> ScannedLine {
        let Some(span) = self.line_span(line) else {
            return ScannedLine::default();
        };
        let text = &self.text[span.start..span.end];
        LineScanner::new(&self.grammar, &self.options, &self.symbols).scan_line(text, span.start, stack)
    }
}

impl ScannedLine {
    /// Move every offset by `delta` bytes.
    fn shift(&mut self, delta: isize) {
        if delta == 0 {
            return;
        }
        for chunk in &mut self.chunks {
            chunk.offset = chunk.offset.saturating_add_signed(delta);
        }
        for diagnostic in &mut self.diagnostics {
            diagnostic.span = Span::new(
                diagnostic.span.start.saturating_add_signed(delta),
                diagnostic.span.end.saturating_add_signed(delta),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hilite_core::lang::styles::StyleTag;

    fn highlighter(text: &str) -> DocumentHighlighter {
        DocumentHighlighter::new(
            Arc::new(Grammar::csharp()),
            ScanOptions::default(),
            DefinedSymbolSet::new(),
            text,
        )
    }

    fn all_chunks(h: &DocumentHighlighter) -> Vec<Vec<Chunk>> {
        (0..h.line_count())
            .map(|line| h.line_chunks(line).unwrap_or_default().to_vec())
            .collect()
    }

    // ========================================================================
    // DirtyLines
    // ========================================================================

    #[test]
    fn test_dirty_merge() {
        let mut dirty = DirtyLines::None;
        dirty.merge(DirtyLines::Single(3));
        assert_eq!(dirty, DirtyLines::Single(3));
        dirty.merge(DirtyLines::Single(5));
        assert_eq!(dirty, DirtyLines::Range { from: 3, to: 6 });
        dirty.merge(DirtyLines::None);
        assert_eq!(dirty, DirtyLines::Range { from: 3, to: 6 });
        dirty.merge(DirtyLines::FromLineToEnd(4));
        assert_eq!(dirty, DirtyLines::FromLineToEnd(3));
        assert!(dirty.contains(100));
        assert!(!dirty.contains(2));
    }

    // ========================================================================
    // Lines
    // ========================================================================

    #[test]
    fn test_line_offsets() {
        assert_eq!(build_line_offsets(""), vec![0]);
        assert_eq!(build_line_offsets("a\nbc\n"), vec![0, 2, 5]);

        let h = highlighter("int a;\nint b;");
        assert_eq!(h.line_count(), 2);
        assert_eq!(h.line_span(1), Some(Span::new(7, 13)));
        assert_eq!(h.line_text(0), Some("int a;"));
        assert_eq!(h.line_at_offset(6), 0);
        assert_eq!(h.line_at_offset(7), 1);
        assert_eq!(h.line_span(2), None);
    }

    // ========================================================================
    // Edits
    // ========================================================================

    #[test]
    fn test_edit_within_line() {
        let mut h = highlighter("int a;\nint b;\nint c;");
        let dirty = h.edit(11..12, "bb").unwrap();
        assert_eq!(dirty, DirtyLines::Single(1));
        assert_eq!(h.text(), "int a;\nint bb;\nint c;");
        assert_eq!(all_chunks(&h), all_chunks(&highlighter(h.text())));
    }

    #[test]
    fn test_edit_opening_comment_rescans_following_lines() {
        let mut h = highlighter("a;\nb;\nc;\n");
        let dirty = h.edit(0..0, "/*").unwrap();
        assert_eq!(dirty, DirtyLines::Range { from: 0, to: 4 });
        assert_eq!(h.line_chunks(2).unwrap()[0].style, StyleTag::CommentBlock);
        assert_eq!(all_chunks(&h), all_chunks(&highlighter(h.text())));
    }

    #[test]
    fn test_edit_toggling_branch() {
        let text = "#define A\n#if A\nint x;\n#else\nint y;\n#endif\nint z;";
        let mut h = highlighter(text);
        assert_eq!(h.line_chunks(4).unwrap()[0].style, StyleTag::ExcludedCode);

        let dirty = h.edit(8..9, "B").unwrap();
        assert_eq!(dirty, DirtyLines::Range { from: 0, to: 7 });
        assert_eq!(h.line_chunks(2).unwrap()[0].style, StyleTag::ExcludedCode);
        assert_eq!(h.line_chunks(4).unwrap()[0].style, StyleTag::KeywordType);
        assert_eq!(all_chunks(&h), all_chunks(&highlighter(h.text())));
    }

    #[test]
    fn test_edit_changing_line_count() {
        let mut h = highlighter("int a;\nint b;");
        let dirty = h.edit(6..6, "\nint c;").unwrap();
        assert_eq!(dirty, DirtyLines::FromLineToEnd(0));
        assert_eq!(h.line_count(), 3);
        assert_eq!(all_chunks(&h), all_chunks(&highlighter(h.text())));
    }

    #[test]
    fn test_edit_errors() {
        let mut h = highlighter("é");
        assert_eq!(
            h.edit(0..5, ""),
            Err(EditError::OutOfBounds {
                start: 0,
                end: 5,
                len: 2
            })
        );
        assert_eq!(h.edit(1..1, "x"), Err(EditError::NotCharBoundary { offset: 1 }));
        assert_eq!(h.edit(0..0, ""), Ok(DirtyLines::None));
    }

    #[test]
    fn test_set_defined_symbols_rebuilds() {
        let mut h = highlighter("#if DEBUG\nint x;\n#endif");
        assert_eq!(h.line_chunks(1).unwrap()[0].style, StyleTag::ExcludedCode);
        let dirty = h.set_defined_symbols(["DEBUG"].into_iter().collect());
        assert_eq!(dirty, DirtyLines::FromLineToEnd(0));
        assert_eq!(h.line_chunks(1).unwrap()[0].style, StyleTag::KeywordType);
    }
}

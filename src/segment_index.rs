//! Per-line interval store of semantic styles.
//!
//! A [`SegmentIndex`] holds the styled name ranges the overlay builder found on one line. It is built lazily on
//! first render and thrown away whole when a new semantic model is published. Once invalidated it accepts no
//! more writes, so a stale build can never leak into the next generation.

use std::collections::{BTreeMap, HashMap};

use hilite_core::lang::styles::StyleTag;
use hilite_syntax::ast::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyledSegment {
    pub start: usize,
    pub end: usize,
    pub style: StyleTag,
}

impl StyledSegment {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

#[derive(Debug, Default)]
pub struct SegmentIndex {
    /// Segments keyed by start offset, in insertion order per start
    by_start: BTreeMap<usize, Vec<StyledSegment>>,
    /// Longest segment seen; bounds how far back a query has to look
    max_len: usize,
    len: usize,
    dirty: bool,
}

impl SegmentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `[start, end)` with `style`. Dropped if the index is dirty or the range is empty.
    pub fn insert(&mut self, start: usize, end: usize, style: StyleTag) -> bool {
        if self.dirty || start >= end {
            return false;
        }
        self.max_len = self.max_len.max(end - start);
        self.by_start
            .entry(start)
            .or_default()
            .push(StyledSegment { start, end, style });
        self.len += 1;
        true
    }

    /// The segment covering `offset`: earliest start first, then earliest insertion.
    pub fn query(&self, offset: usize) -> Option<StyledSegment> {
        if self.dirty {
            return None;
        }
        let from = offset.saturating_sub(self.max_len);
        self.by_start
            .range(from..=offset)
            .flat_map(|(_, segments)| segments.iter())
            .find(|segment| segment.end > offset)
            .copied()
    }

    /// Mark the index stale. Later inserts are ignored and queries find nothing.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyledSegment> {
        self.by_start.values().flatten()
    }
}

/// Lazily built segment indexes, one per line.
#[derive(Debug, Default)]
pub struct LineSegments {
    lines: HashMap<usize, SegmentIndex>,
}

impl LineSegments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&mut self, line: usize, build: impl FnOnce() -> SegmentIndex) -> &SegmentIndex {
        self.lines.entry(line).or_insert_with(build)
    }

    pub fn get(&self, line: usize) -> Option<&SegmentIndex> {
        self.lines.get(&line)
    }

    /// Drop every index, invalidating each first.
    pub fn clear(&mut self) {
        for index in self.lines.values_mut() {
            index.invalidate();
        }
        self.lines.clear();
    }

    /// Number of lines with a built index.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

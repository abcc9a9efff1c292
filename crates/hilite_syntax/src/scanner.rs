//! Line scanner for C# source.
//!
//! Scans one line at a time against the [`SpanStack`] in effect at the line start and produces the lexical
//! chunks for that line. The stack is updated in place, so after a call it holds the state for the start of the
//! next line.
//!
//! Handles:
//! - Keywords, identifiers, numbers and punctuation
//! - Line, doc and block comments (with comment tags and URLs)
//! - Regular, interpolated, verbatim and char literals
//! - Preprocessor directives, including conditional blocks and `#define` / `#undef`
//! - Excluded code inside false branches, painted as one chunk and never tokenized

use hilite_core::lang::directives::{self, DirectiveId, DirectiveKind};
use hilite_core::lang::keywords::{self, KeywordId};
use hilite_core::lang::styles::StyleTag;

use crate::ast::Span;
use crate::defines::DefinedSymbolSet;
use crate::diagnostics::{CompileError, errors};
use crate::eval::evaluate;
use crate::expr::parse_condition;
use crate::grammar::Grammar;
use crate::span::{Rule, SpanEntry, SpanStack};

/// Scanner switches that can change while documents are open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Track conditional blocks and paint false branches as excluded code.
    pub conditional_highlighting: bool,
    /// Words painted as comment tags inside comments.
    pub comment_tags: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            conditional_highlighting: true,
            comment_tags: ["TODO", "FIXME", "HACK", "UNDONE"].into_iter().map(String::from).collect(),
        }
    }
}

impl ScanOptions {
    pub fn with_conditional_highlighting(mut self, enabled: bool) -> Self {
        self.conditional_highlighting = enabled;
        self
    }

    pub fn with_comment_tags(mut self, tags: Vec<String>) -> Self {
        self.comment_tags = tags;
        self
    }
}

/// Coarse token class of a chunk, used by consumers that need more than the style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    Whitespace,
    Identifier,
    Keyword(KeywordId),
    Number,
    String,
    Char,
    Punctuation,
    Comment,
    Directive,
    Excluded,
}

impl TokenClass {
    /// Whether the chunk is active source code (as opposed to trivia, directives or excluded text).
    pub fn is_code(self) -> bool {
        matches!(
            self,
            TokenClass::Identifier
                | TokenClass::Keyword(_)
                | TokenClass::Number
                | TokenClass::String
                | TokenClass::Char
                | TokenClass::Punctuation
        )
    }
}

/// A contiguous run of text with one style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chunk {
    pub offset: usize,
    pub length: usize,
    pub style: StyleTag,
    pub rule: Rule,
    pub class: TokenClass,
}

impl Chunk {
    pub fn new(offset: usize, length: usize, style: StyleTag, rule: Rule, class: TokenClass) -> Self {
        Self {
            offset,
            length,
            style,
            rule,
            class,
        }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn span(&self) -> Span {
        Span::new(self.offset, self.end())
    }
}

/// Output of scanning one line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScannedLine {
    pub chunks: Vec<Chunk>,
    pub diagnostics: Vec<CompileError>,
}

/// Per-line scan position.
struct Cursor<'t> {
    text: &'t str,
    pos: usize,
    base: usize,
    out: ScannedLine,
}

impl<'t> Cursor<'t> {
    fn new(text: &'t str, base: usize) -> Self {
        Self {
            text,
            pos: 0,
            base,
            out: ScannedLine::default(),
        }
    }

    fn rest(&self) -> &'t str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn advance_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.advance();
        }
    }

    fn span(&self, start: usize, end: usize) -> Span {
        Span::new(self.base + start, self.base + end)
    }

    fn emit(&mut self, start: usize, end: usize, style: StyleTag, rule: Rule, class: TokenClass) {
        if end > start {
            self.out
                .chunks
                .push(Chunk::new(self.base + start, end - start, style, rule, class));
        }
    }

    fn finish(self) -> ScannedLine {
        self.out
    }
}

/// Scans lines of one document.
///
/// Borrowing everything keeps the scanner free to construct per call; the grammar is shared and immutable.
pub struct LineScanner<'a> {
    grammar: &'a Grammar,
    options: &'a ScanOptions,
    symbols: &'a DefinedSymbolSet,
}

impl<'a> LineScanner<'a> {
    pub fn new(grammar: &'a Grammar, options: &'a ScanOptions, symbols: &'a DefinedSymbolSet) -> Self {
        Self {
            grammar,
            options,
            symbols,
        }
    }

    /// Scan one line (without its line terminator) that starts at document offset `line_offset`.
    pub fn scan_line(&self, text: &str, line_offset: usize, stack: &mut SpanStack) -> ScannedLine {
        let mut cur = Cursor::new(text, line_offset);

        // Multi-line spans carried over from the previous line
        let continued = match stack.top() {
            Some(SpanEntry::BlockComment) => Some(self.continue_block_comment(&mut cur, stack, 0)),
            Some(SpanEntry::VerbatimString) => Some(self.continue_verbatim_string(&mut cur, stack, 0)),
            _ => None,
        };
        match continued {
            Some(false) => return cur.finish(),
            Some(true) => {}
            None => {
                let indent = text.len() - text.trim_start().len();
                if text[indent..].starts_with('#') {
                    cur.emit(0, indent, StyleTag::PlainText, stack.code_rule(), TokenClass::Whitespace);
                    cur.pos = indent;
                    self.scan_directive(&mut cur, stack);
                    return cur.finish();
                }
            }
        }

        if self.options.conditional_highlighting && stack.excluded() {
            let start = cur.pos;
            cur.emit(
                start,
                text.len(),
                StyleTag::ExcludedCode,
                Rule::PreProcessorComment,
                TokenClass::Excluded,
            );
            return cur.finish();
        }

        self.scan_code(&mut cur, stack);
        cur.finish()
    }

    /// Scan a whole text from an empty stack, one [`ScannedLine`] per `\n`-separated line.
    #[tracing::instrument(skip_all, fields(source_len = text.len()))]
    pub fn scan_text(&self, text: &str) -> Vec<ScannedLine> {
        let mut stack = SpanStack::new();
        let mut offset = 0;
        let mut lines = Vec::new();
        for line in text.split('\n') {
            lines.push(self.scan_line(line, offset, &mut stack));
            offset += line.len() + 1;
        }
        lines
    }

    // ========================================================================
    // Preprocessor directives
    // ========================================================================

    fn scan_directive(&self, cur: &mut Cursor<'_>, stack: &mut SpanStack) {
        let text = cur.text;
        let hash = cur.pos;
        let line_end = text.len();

        if !self.options.conditional_highlighting {
            cur.emit(hash, line_end, StyleTag::Preprocessor, Rule::PreProcessor, TokenClass::Directive);
            return;
        }

        cur.advance();
        cur.advance_while(|c| c == ' ' || c == '\t');
        let name_start = cur.pos;
        cur.advance_while(char::is_alphabetic);
        let name_end = cur.pos;
        let name = &text[name_start..name_end];
        let excluded = stack.excluded();

        let Some(id) = directives::from_str(name) else {
            if !excluded {
                let span = cur.span(hash, name_end);
                cur.out.diagnostics.push(errors::unknown_directive(name, span));
            }
            self.emit_directive_line(cur, hash, line_end, excluded);
            return;
        };

        // Conditions and symbols stop at a trailing line comment
        let comment_start = text[name_end..].find("//").map(|idx| name_end + idx);
        let arg_end = comment_start.unwrap_or(line_end);
        let raw_arg = &text[name_end..arg_end];
        let arg = raw_arg.trim();
        let arg_offset = cur.base + name_end + (raw_arg.len() - raw_arg.trim_start().len());

        match directives::kind(id) {
            DirectiveKind::Conditional => {
                let symbols = stack.defined_symbols(self.symbols);
                let diagnostics = &mut cur.out.diagnostics;
                let recognized = match id {
                    DirectiveId::If => {
                        let value = self.condition(diagnostics, name, arg, arg_offset, &symbols, !excluded);
                        stack.scan_if(value);
                        true
                    }
                    DirectiveId::Elif => {
                        let report = !stack.innermost_conditional().is_some_and(|span| span.disabled);
                        stack
                            .scan_elif(|| self.condition(diagnostics, name, arg, arg_offset, &symbols, report))
                            .is_some()
                    }
                    DirectiveId::Else => stack.scan_else().is_some(),
                    _ => stack.scan_endif().is_some(),
                };
                if !recognized {
                    let span = cur.span(hash, name_end);
                    cur.out.diagnostics.push(errors::unmatched_directive(name, span));
                }
                cur.emit(hash, arg_end, StyleTag::Preprocessor, Rule::PreProcessor, TokenClass::Directive);
                if let Some(start) = comment_start {
                    self.emit_comment(cur, start, line_end, StyleTag::CommentLine);
                }
            }
            DirectiveKind::Symbol => {
                if excluded {
                    self.emit_directive_line(cur, hash, line_end, true);
                    return;
                }
                if arg.is_empty() {
                    let span = cur.span(hash, name_end);
                    cur.out.diagnostics.push(errors::missing_symbol(name, span));
                } else if id == DirectiveId::Define {
                    stack.scan_define(arg);
                } else {
                    stack.scan_undef(arg);
                }
                cur.emit(hash, arg_end, StyleTag::Preprocessor, Rule::PreProcessor, TokenClass::Directive);
                if let Some(start) = comment_start {
                    self.emit_comment(cur, start, line_end, StyleTag::CommentLine);
                }
            }
            DirectiveKind::Other => self.emit_directive_line(cur, hash, line_end, excluded),
        }
        cur.pos = line_end;
    }

    fn emit_directive_line(&self, cur: &mut Cursor<'_>, start: usize, end: usize, excluded: bool) {
        if excluded {
            cur.emit(
                start,
                end,
                StyleTag::ExcludedCode,
                Rule::PreProcessorComment,
                TokenClass::Excluded,
            );
        } else {
            cur.emit(start, end, StyleTag::Preprocessor, Rule::PreProcessor, TokenClass::Directive);
        }
        cur.pos = end;
    }

    /// Evaluate an `#if`/`#elif` condition; unparseable conditions are `false`.
    fn condition(
        &self,
        diagnostics: &mut Vec<CompileError>,
        directive: &str,
        text: &str,
        offset: usize,
        symbols: &DefinedSymbolSet,
        report: bool,
    ) -> bool {
        match parse_condition(text) {
            Ok(expr) => evaluate(&expr, symbols),
            Err(err) => {
                if report {
                    let span = err.span().offset_by(offset);
                    diagnostics.push(errors::malformed_condition(directive, &err.to_string(), span));
                }
                false
            }
        }
    }

    // ========================================================================
    // Code
    // ========================================================================

    fn scan_code(&self, cur: &mut Cursor<'_>, stack: &mut SpanStack) {
        let line_end = cur.text.len();
        while let Some(c) = cur.peek() {
            let start = cur.pos;

            if c.is_whitespace() {
                cur.advance_while(char::is_whitespace);
                cur.emit(start, cur.pos, StyleTag::PlainText, Rule::Root, TokenClass::Whitespace);
            } else if cur.starts_with("///") {
                self.emit_comment(cur, start, line_end, StyleTag::CommentDoc);
                cur.pos = line_end;
            } else if cur.starts_with("//") {
                self.emit_comment(cur, start, line_end, StyleTag::CommentLine);
                cur.pos = line_end;
            } else if cur.starts_with("/*") {
                cur.pos += 2;
                stack.push(SpanEntry::BlockComment);
                if !self.continue_block_comment(cur, stack, start) {
                    return;
                }
            } else if let Some(prefix) = ["@\"", "$@\"", "@$\""].into_iter().find(|p| cur.starts_with(p)) {
                cur.pos += prefix.len();
                stack.push(SpanEntry::VerbatimString);
                if !self.continue_verbatim_string(cur, stack, start) {
                    return;
                }
            } else if c == '"' || cur.starts_with("$\"") {
                cur.pos += if c == '$' { 2 } else { 1 };
                let end = quoted_end(cur.text, cur.pos, b'"');
                self.emit_string(cur, start, end, StyleTag::String);
                cur.pos = end;
            } else if c == '\'' {
                let end = quoted_end(cur.text, cur.pos + 1, b'\'');
                cur.emit(start, end, StyleTag::CharLiteral, Rule::String, TokenClass::Char);
                cur.pos = end;
            } else if c.is_ascii_digit() {
                self.scan_number(cur);
                cur.emit(start, cur.pos, StyleTag::Number, Rule::Root, TokenClass::Number);
            } else if c == '@' && cur.peek_nth(1).is_some_and(is_ident_start) {
                // Verbatim identifier: never a keyword
                cur.advance();
                cur.advance_while(is_ident_continue);
                cur.emit(start, cur.pos, StyleTag::PlainText, Rule::Root, TokenClass::Identifier);
            } else if is_ident_start(c) {
                cur.advance_while(is_ident_continue);
                let word = &cur.text[start..cur.pos];
                match self.grammar.keyword(word) {
                    Some(id) => cur.emit(
                        start,
                        cur.pos,
                        keywords::style_of(id),
                        Rule::Root,
                        TokenClass::Keyword(id),
                    ),
                    None => cur.emit(start, cur.pos, StyleTag::PlainText, Rule::Root, TokenClass::Identifier),
                }
            } else {
                cur.advance();
                cur.emit(start, cur.pos, StyleTag::Punctuation, Rule::Root, TokenClass::Punctuation);
            }
        }
    }

    fn scan_number(&self, cur: &mut Cursor<'_>) {
        loop {
            match cur.peek() {
                Some(c) if c.is_ascii_alphanumeric() || c == '_' => cur.advance(),
                Some('.') if cur.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => cur.advance(),
                _ => break,
            }
        }
    }

    /// Continue a block comment whose text starts at `start` on this line. Returns whether it closed.
    fn continue_block_comment(&self, cur: &mut Cursor<'_>, stack: &mut SpanStack, start: usize) -> bool {
        match cur.rest().find("*/") {
            Some(idx) => {
                let end = cur.pos + idx + 2;
                self.emit_comment(cur, start, end, StyleTag::CommentBlock);
                cur.pos = end;
                stack.pop();
                true
            }
            None => {
                let end = cur.text.len();
                self.emit_comment(cur, start, end, StyleTag::CommentBlock);
                cur.pos = end;
                false
            }
        }
    }

    /// Continue a verbatim string whose text starts at `start` on this line. Returns whether it closed.
    fn continue_verbatim_string(&self, cur: &mut Cursor<'_>, stack: &mut SpanStack, start: usize) -> bool {
        let bytes = cur.text.as_bytes();
        let mut i = cur.pos;
        while i < bytes.len() {
            if bytes[i] == b'"' {
                if bytes.get(i + 1) == Some(&b'"') {
                    i += 2;
                    continue;
                }
                let end = i + 1;
                self.emit_string(cur, start, end, StyleTag::VerbatimString);
                cur.pos = end;
                stack.pop();
                return true;
            }
            i += 1;
        }
        let end = cur.text.len();
        self.emit_string(cur, start, end, StyleTag::VerbatimString);
        cur.pos = end;
        false
    }

    // ========================================================================
    // Decorated text (comments and strings)
    // ========================================================================

    fn emit_comment(&self, cur: &mut Cursor<'_>, start: usize, end: usize, style: StyleTag) {
        let marks = self.decorations(&cur.text[start..end], true);
        emit_decorated(cur, start, end, style, Rule::Comment, TokenClass::Comment, &marks);
    }

    fn emit_string(&self, cur: &mut Cursor<'_>, start: usize, end: usize, style: StyleTag) {
        let marks = self.decorations(&cur.text[start..end], false);
        emit_decorated(cur, start, end, style, Rule::String, TokenClass::String, &marks);
    }

    /// Comment tags (whole words) and URLs inside `text`, as sorted, non-overlapping relative ranges.
    fn decorations(&self, text: &str, with_tags: bool) -> Vec<(usize, usize, StyleTag)> {
        let mut marks = Vec::new();
        if with_tags {
            for tag in self.options.comment_tags.iter().filter(|t| !t.is_empty()) {
                for (idx, _) in text.match_indices(tag.as_str()) {
                    let end = idx + tag.len();
                    let before_ok = !text[..idx].chars().next_back().is_some_and(is_ident_continue);
                    let after_ok = !text[end..].chars().next().is_some_and(is_ident_continue);
                    if before_ok && after_ok {
                        marks.push((idx, end, StyleTag::CommentTag));
                    }
                }
            }
        }
        for scheme in ["http://", "https://"] {
            for (idx, _) in text.match_indices(scheme) {
                let len = text[idx..]
                    .find(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>' | '(' | ')'))
                    .unwrap_or(text.len() - idx);
                if len > scheme.len() {
                    marks.push((idx, idx + len, StyleTag::Link));
                }
            }
        }
        marks.sort_by_key(|&(start, end, _)| (start, std::cmp::Reverse(end)));
        let mut merged: Vec<(usize, usize, StyleTag)> = Vec::with_capacity(marks.len());
        for mark in marks {
            if merged.last().is_none_or(|last| mark.0 >= last.1) {
                merged.push(mark);
            }
        }
        merged
    }
}

fn emit_decorated(
    cur: &mut Cursor<'_>,
    start: usize,
    end: usize,
    style: StyleTag,
    rule: Rule,
    class: TokenClass,
    marks: &[(usize, usize, StyleTag)],
) {
    let mut pos = start;
    for &(mark_start, mark_end, mark_style) in marks {
        cur.emit(pos, start + mark_start, style, rule, class);
        cur.emit(start + mark_start, start + mark_end, mark_style, rule, class);
        pos = start + mark_end;
    }
    cur.emit(pos, end, style, rule, class);
}

/// End of a quoted literal whose body starts at `from`: just past the closing quote, or the end of the line.
fn quoted_end(text: &str, from: usize, quote: u8) -> usize {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

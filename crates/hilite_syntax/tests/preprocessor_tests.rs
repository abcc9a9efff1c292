use std::sync::Arc;

use hilite_core::lang::styles::StyleTag;
use hilite_syntax::{DefinedSymbolSet, DocumentHighlighter, Grammar, ScanOptions, TokenClass};
use proptest::prelude::*;

fn highlight(text: &str, symbols: &[&str]) -> DocumentHighlighter {
    DocumentHighlighter::new(
        Arc::new(Grammar::csharp()),
        ScanOptions::default(),
        symbols.iter().copied().collect::<DefinedSymbolSet>(),
        text,
    )
}

/// Style of the first non-whitespace chunk on `line`.
fn line_style(h: &DocumentHighlighter, line: usize) -> StyleTag {
    h.line_chunks(line)
        .and_then(|chunks| chunks.iter().find(|c| c.class != TokenClass::Whitespace))
        .map(|chunk| chunk.style)
        .unwrap_or(StyleTag::PlainText)
}

/// Line number of the first line equal to `needle` after trimming.
fn line_of(h: &DocumentHighlighter, needle: &str) -> usize {
    (0..h.line_count())
        .find(|&line| h.line_text(line).map(str::trim) == Some(needle))
        .unwrap_or_else(|| panic!("line {needle:?} not found"))
}

/// Wrap `body` in `depth` enclosing `#if true` blocks.
fn nest(depth: usize, body: &str) -> String {
    let mut text = String::new();
    for _ in 0..depth {
        text.push_str("#if true\n");
    }
    text.push_str(body);
    for _ in 0..depth {
        text.push_str("\n#endif");
    }
    text
}

const EXCLUDED: StyleTag = StyleTag::ExcludedCode;
const ACTIVE: StyleTag = StyleTag::KeywordType;

// ============================================================================
// Conditional blocks
// ============================================================================

#[test]
fn if_false_else_at_every_depth() {
    for depth in 0..5 {
        let h = highlight(&nest(depth, "#if false\nint a;\n#else\nint b;\n#endif\nint c;"), &[]);
        assert_eq!(line_style(&h, line_of(&h, "int a;")), EXCLUDED, "depth {depth}");
        assert_eq!(line_style(&h, line_of(&h, "int b;")), ACTIVE, "depth {depth}");
        assert_eq!(line_style(&h, line_of(&h, "int c;")), ACTIVE, "depth {depth}");

        let h = highlight(&nest(depth, "#if true\nint a;\n#else\nint b;\n#endif"), &[]);
        assert_eq!(line_style(&h, line_of(&h, "int a;")), ACTIVE, "depth {depth}");
        assert_eq!(line_style(&h, line_of(&h, "int b;")), EXCLUDED, "depth {depth}");
    }
}

#[test]
fn elif_after_true_sibling_is_excluded() {
    for depth in 0..4 {
        let h = highlight(&nest(depth, "#if true\nint a;\n#elif true\nint b;\n#else\nint c;\n#endif"), &[]);
        assert_eq!(line_style(&h, line_of(&h, "int a;")), ACTIVE, "depth {depth}");
        assert_eq!(line_style(&h, line_of(&h, "int b;")), EXCLUDED, "depth {depth}");
        assert_eq!(line_style(&h, line_of(&h, "int c;")), EXCLUDED, "depth {depth}");
    }
}

#[test]
fn first_matching_branch_wins() {
    let text = "#if false\nint a;\n#elif B\nint b;\n#elif true\nint c;\n#else\nint d;\n#endif";
    let h = highlight(text, &["B"]);
    let styles: Vec<StyleTag> = ["int a;", "int b;", "int c;", "int d;"]
        .iter()
        .map(|line| line_style(&h, line_of(&h, line)))
        .collect();
    assert_eq!(styles, vec![EXCLUDED, ACTIVE, EXCLUDED, EXCLUDED]);

    let h = highlight(text, &[]);
    let styles: Vec<StyleTag> = ["int a;", "int b;", "int c;", "int d;"]
        .iter()
        .map(|line| line_style(&h, line_of(&h, line)))
        .collect();
    assert_eq!(styles, vec![EXCLUDED, EXCLUDED, ACTIVE, EXCLUDED]);
}

#[test]
fn inner_true_inside_outer_false_is_excluded() {
    for depth in 1..5 {
        let mut text = String::from("#if false\n");
        for _ in 0..depth {
            text.push_str("#if true\n");
        }
        text.push_str("int inner;");
        for _ in 0..depth {
            text.push_str("\n#else\nint other;\n#endif");
        }
        text.push_str("\n#endif\nint after;");
        let h = highlight(&text, &[]);
        assert_eq!(line_style(&h, line_of(&h, "int inner;")), EXCLUDED, "depth {depth}");
        assert_eq!(line_style(&h, line_of(&h, "int other;")), EXCLUDED, "depth {depth}");
        assert_eq!(line_style(&h, line_of(&h, "int after;")), ACTIVE, "depth {depth}");
    }
}

#[test]
fn directive_lines_stay_preprocessor_styled() {
    let h = highlight("#if false\n#if true\n#endif\n#endif", &[]);
    for line in 0..h.line_count() {
        assert_eq!(line_style(&h, line), StyleTag::Preprocessor);
    }
}

// ============================================================================
// Symbols
// ============================================================================

#[test]
fn define_enables_later_if() {
    for depth in 0..4 {
        let h = highlight(&nest(depth, "#define FOO\n#if FOO\nint a;\n#endif"), &[]);
        assert_eq!(line_style(&h, line_of(&h, "int a;")), ACTIVE, "depth {depth}");
    }
}

#[test]
fn define_survives_end_of_enclosing_block() {
    let h = highlight("#if true\n#define FOO\n#endif\n#if FOO\nint a;\n#endif", &[]);
    assert_eq!(line_style(&h, line_of(&h, "int a;")), ACTIVE);
}

#[test]
fn define_inside_excluded_branch_is_ignored() {
    let h = highlight("#if false\n#define FOO\n#endif\n#if FOO\nint a;\n#endif", &[]);
    assert_eq!(line_style(&h, 1), EXCLUDED);
    assert_eq!(line_style(&h, line_of(&h, "int a;")), EXCLUDED);
}

#[test]
fn define_in_elif_of_failed_if_is_ignored() {
    let h = highlight("#if false\n#elif true\n#define FOO\n#endif\n#if FOO\nint x;\n#endif", &[]);
    assert_eq!(line_style(&h, line_of(&h, "int x;")), EXCLUDED);

    let h = highlight("#if true\n#else\n#define FOO\n#endif\n#if FOO\nint x;\n#endif", &[]);
    assert_eq!(line_style(&h, line_of(&h, "int x;")), ACTIVE);
}

#[test]
fn undef_removes_configured_symbol() {
    let h = highlight("#undef DEBUG\n#if DEBUG\nint a;\n#endif", &["DEBUG"]);
    assert_eq!(line_style(&h, line_of(&h, "int a;")), EXCLUDED);
}

#[test]
fn configured_symbols_feed_conditions() {
    let text = "#if DEBUG && !TRACE\nint a;\n#endif";
    assert_eq!(line_style(&highlight(text, &["DEBUG"]), 1), ACTIVE);
    assert_eq!(line_style(&highlight(text, &["DEBUG", "TRACE"]), 1), EXCLUDED);
}

// ============================================================================
// Degenerate input
// ============================================================================

#[test]
fn unmatched_directives_do_not_disturb_code() {
    let h = highlight("#elif true\n#else\n#endif\nint a;", &[]);
    assert_eq!(line_style(&h, 0), StyleTag::Preprocessor);
    assert_eq!(line_style(&h, 3), ACTIVE);
    assert_eq!(h.diagnostics().count(), 3);
}

#[test]
fn malformed_condition_is_false() {
    let h = highlight("#if (A &&\nint a;\n#else\nint b;\n#endif", &["A"]);
    assert_eq!(line_style(&h, 1), EXCLUDED);
    assert_eq!(line_style(&h, 3), ACTIVE);
    assert_eq!(h.diagnostics().count(), 1);
}

#[test]
fn unterminated_block_excludes_to_end() {
    let h = highlight("#if false\nint a;\nint b;", &[]);
    assert_eq!(line_style(&h, 1), EXCLUDED);
    assert_eq!(line_style(&h, 2), EXCLUDED);
}

// ============================================================================
// Incremental rescans
// ============================================================================

const FRAGMENTS: &[&str] = &[
    "#if A",
    "#if !A && B",
    "#elif B",
    "#else",
    "#endif",
    "#define A",
    "#undef B",
    "int x = 1;",
    "/* open",
    "close */",
    "var s = @\"multi",
    "line\";",
    "// TODO see http://example.org",
    "class C { void M() { } }",
    "",
];

fn document() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(FRAGMENTS), 0..14).prop_map(|lines| lines.join("\n"))
}

fn edit() -> impl Strategy<Value = (usize, usize, &'static str, bool)> {
    (
        any::<usize>(),
        any::<usize>(),
        prop::sample::select(FRAGMENTS),
        any::<bool>(),
    )
}

proptest! {
    #[test]
    fn incremental_edits_match_full_rescan(
        text in document(),
        edits in prop::collection::vec(edit(), 1..4),
        symbols in prop::sample::subsequence(vec!["A", "B"], 0..=2),
    ) {
        let mut h = highlight(&text, &symbols);
        for (a, b, fragment, newline) in edits {
            let len = h.text().len();
            let start = a % (len + 1);
            let end = start + b % (len - start + 1);
            let replacement = if newline { format!("{fragment}\n") } else { fragment.to_string() };
            h.edit(start..end, &replacement).unwrap();
        }

        let fresh = highlight(h.text(), &symbols);
        prop_assert_eq!(h.line_count(), fresh.line_count());
        for line in 0..h.line_count() {
            prop_assert_eq!(h.line_chunks(line), fresh.line_chunks(line), "line {}", line);
            prop_assert_eq!(h.line_start_stack(line), fresh.line_start_stack(line), "line {}", line);
        }
    }

    #[test]
    fn chunks_tile_every_line(text in document(), symbols in prop::sample::subsequence(vec!["A", "B"], 0..=2)) {
        let h = highlight(&text, &symbols);
        for line in 0..h.line_count() {
            let span = h.line_span(line).unwrap();
            let mut pos = span.start;
            for chunk in h.line_chunks(line).unwrap() {
                prop_assert_eq!(chunk.offset, pos);
                prop_assert!(chunk.length > 0);
                pos = chunk.end();
            }
            prop_assert_eq!(pos, span.end);
        }
    }
}

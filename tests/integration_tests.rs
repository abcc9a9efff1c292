//! End-to-end tests: sessions, background passes and rendered lines

use std::cell::Cell;
use std::rc::Rc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hilite::cli::commands::format_styled_line;
use hilite::semantic::{DocumentSnapshot, ModelProvider, OutlineModelProvider, SemanticModel};
use hilite::{BuildConfiguration, DocumentSession, EngineContext, HighlightResult, HighlightSettings, Workbench};
use hilite_core::lang::styles::StyleTag;
use hilite_syntax::{DefinedSymbolSet, Grammar};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

fn open(text: &str) -> DocumentSession {
    DocumentSession::open(
        "test.cs",
        text,
        &EngineContext::outline(Handle::current()),
        HighlightSettings::default(),
        DefinedSymbolSet::new(),
    )
}

/// Every line as `N: "text"=Style ...`, without the column padding.
fn dump(session: &mut DocumentSession) -> String {
    let lines: Vec<_> = (0..session.line_count())
        .map(|line| session.styled_line(line).unwrap_or_default())
        .collect();
    lines
        .iter()
        .enumerate()
        .map(|(line, chunks)| format_styled_line(session.text(), line, chunks).trim_start().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Style at the first occurrence of `word` on `line`.
fn style_of(session: &mut DocumentSession, line: usize, word: &str) -> Option<StyleTag> {
    let span = session.highlighter().line_span(line)?;
    let column = session.text()[span.start..span.end].find(word)?;
    let offset = span.start + column;
    session
        .styled_line(line)?
        .into_iter()
        .find(|chunk| chunk.offset <= offset && offset < chunk.end())
        .map(|chunk| chunk.style)
}

// ============================================================================
// Rendering
// ============================================================================

#[tokio::test]
async fn semantic_overlay_rendering() {
    let mut session = open("class Point {\n    int x;\n    int Get() { return x + y; }\n}");
    assert!(session.wait_for_analysis().await);
    insta::assert_snapshot!(dump(&mut session), @r###"
    1: "class"=Keyword(Declaration) "Point"=User Types "{"=Punctuation
    2: "int"=Keyword(Type) "x"=User Field Declaration ";"=Punctuation
    3: "int"=Keyword(Type) "Get"=User Method Declaration "("=Punctuation ")"=Punctuation "{"=Punctuation "return"=Keyword(Jump) "x"=User Field Usage "+"=Punctuation "y"=Plain Text ";"=Punctuation "}"=Punctuation
    4: "}"=Punctuation
    "###);
}

#[tokio::test]
async fn lexical_rendering_before_first_pass() {
    let mut session = open("class Point {\n    int x;\n}");
    // The pass has not been applied yet, so only lexical styles show.
    insta::assert_snapshot!(dump(&mut session), @r###"
    1: "class"=Keyword(Declaration) "Point"=Plain Text "{"=Punctuation
    2: "int"=Keyword(Type) "x"=Plain Text ";"=Punctuation
    3: "}"=Punctuation
    "###);
    assert_eq!(session.cached_segment_lines(), 0);
}

#[tokio::test]
async fn comments_and_excluded_code_keep_lexical_styles() {
    let mut session = open("class A {\n    int x; // x\n#if DEBUG\n    int y = x;\n#endif\n}");
    session.wait_for_analysis().await;
    assert_eq!(style_of(&mut session, 1, "x"), Some(StyleTag::FieldDeclaration));
    assert_eq!(style_of(&mut session, 1, "// x"), Some(StyleTag::CommentLine));
    assert_eq!(style_of(&mut session, 3, "int y"), Some(StyleTag::ExcludedCode));
    assert!(session.quick_tasks().is_empty());
}

#[tokio::test]
async fn contextual_keywords_and_var() {
    let text = "class A {\n  int v;\n  int V { set { v = value; } }\n  void M() { var n = v; Use(n); }\n  void Use(int p) { }\n}";
    let mut session = open(text);
    session.wait_for_analysis().await;
    assert_eq!(style_of(&mut session, 2, "value"), Some(StyleTag::KeywordContext));
    assert_eq!(style_of(&mut session, 2, "V"), Some(StyleTag::PropertyDeclaration));
    assert_eq!(style_of(&mut session, 3, "var"), Some(StyleTag::KeywordType));
    assert_eq!(style_of(&mut session, 3, "n"), Some(StyleTag::VariableDeclaration));
    assert_eq!(style_of(&mut session, 3, "Use"), Some(StyleTag::MethodUsage));
    assert_eq!(style_of(&mut session, 4, "p"), Some(StyleTag::ParameterDeclaration));
}

// ============================================================================
// Quick tasks
// ============================================================================

#[tokio::test]
async fn unresolved_identifier_produces_one_task() {
    let text = "class A {\n  int known;\n  void M() { known = missing; }\n}";
    let mut session = open(text);
    session.wait_for_analysis().await;

    let tasks = session.quick_tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].offset(), text.find("missing").unwrap());
    assert_eq!(
        tasks[0].message(),
        "error CS0103: The name `missing' does not exist in the current context"
    );
}

#[tokio::test]
async fn tasks_updated_fires_once_per_publish() {
    let mut session = open("class A { void M() { a(); } }");
    let fired = Rc::new(Cell::new(0));
    let counter = Rc::clone(&fired);
    session.on_tasks_updated(move || counter.set(counter.get() + 1));

    assert!(session.wait_for_analysis().await);
    assert_eq!(fired.get(), 1);
    assert_eq!(session.quick_tasks().len(), 1);

    // Fix the name; the next pass clears the task.
    let offset = session.text().find("a()").unwrap();
    session.edit(offset..offset + 1, "M").unwrap();
    assert!(session.wait_for_analysis().await);
    assert_eq!(fired.get(), 2);
    assert!(session.quick_tasks().is_empty());
}

// ============================================================================
// Cancellation
// ============================================================================

/// Blocks each pass until the test releases it.
struct GatedProvider {
    inner: OutlineModelProvider,
    gate: Mutex<Receiver<()>>,
    finished: Mutex<Sender<()>>,
}

impl ModelProvider for GatedProvider {
    fn semantic_model(
        &self,
        snapshot: &DocumentSnapshot,
        cancel: &CancellationToken,
    ) -> HighlightResult<Option<Arc<dyn SemanticModel>>> {
        if let Ok(gate) = self.gate.lock() {
            let _ = gate.recv();
        }
        let result = self.inner.semantic_model(snapshot, cancel);
        if let Ok(finished) = self.finished.lock() {
            let _ = finished.send(());
        }
        result
    }
}

fn gated() -> (EngineContext, Sender<()>, Receiver<()>) {
    let (release, gate) = channel();
    let (finished_tx, finished) = channel();
    let grammar = Arc::new(Grammar::csharp());
    let provider = GatedProvider {
        inner: OutlineModelProvider::new(Arc::clone(&grammar)),
        gate: Mutex::new(gate),
        finished: Mutex::new(finished_tx),
    };
    let context = EngineContext::new(grammar, Arc::new(provider), Handle::current());
    (context, release, finished)
}

#[tokio::test]
async fn cancelled_pass_publishes_nothing() {
    let (context, release, finished) = gated();
    let mut session = DocumentSession::open(
        "test.cs",
        "class A { void M() { nope(); } }",
        &context,
        HighlightSettings::default(),
        DefinedSymbolSet::new(),
    );
    let fired = Rc::new(Cell::new(0));
    let counter = Rc::clone(&fired);
    session.on_tasks_updated(move || counter.set(counter.get() + 1));

    session.set_semantic_highlighting(false);
    release.send(()).unwrap();
    let _ = tokio::task::spawn_blocking(move || finished.recv_timeout(Duration::from_secs(5))).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!session.poll());
    assert!(!session.wait_for_analysis().await);
    assert_eq!(fired.get(), 0);
    assert!(session.quick_tasks().is_empty());
    assert!(!session.has_model());
    session.styled_line(0);
    assert_eq!(session.cached_segment_lines(), 0);
}

#[tokio::test]
async fn superseded_pass_is_discarded() {
    let (context, release, _finished) = gated();
    let mut session = DocumentSession::open(
        "test.cs",
        "class A { void M() { first(); } }",
        &context,
        HighlightSettings::default(),
        DefinedSymbolSet::new(),
    );
    let fired = Rc::new(Cell::new(0));
    let counter = Rc::clone(&fired);
    session.on_tasks_updated(move || counter.set(counter.get() + 1));

    let offset = session.text().find("first").unwrap();
    session.edit(offset..offset + 5, "second").unwrap();
    release.send(()).unwrap();
    release.send(()).unwrap();

    assert!(session.wait_for_analysis().await);
    assert_eq!(fired.get(), 1);
    let names: Vec<_> = session.quick_tasks().iter().map(|task| task.name().to_string()).collect();
    assert_eq!(names, vec!["second"]);
}

// ============================================================================
// Configuration
// ============================================================================

#[tokio::test]
async fn configuration_change_reanalyzes_documents() {
    let mut bench = Workbench::new(
        EngineContext::outline(Handle::current()),
        HighlightSettings::default(),
        BuildConfiguration::default(),
    );
    let text = "class A {\n#if DEBUG\n  void Trace() { }\n#endif\n  void M() { Trace(); }\n}";
    bench.open("a.cs", text).wait_for_analysis().await;
    assert_eq!(bench.get("a.cs").unwrap().quick_tasks().len(), 1);

    bench.set_active_configuration(BuildConfiguration::new(["DEBUG"]));
    let session = bench.get_mut("a.cs").unwrap();
    assert!(session.wait_for_analysis().await);
    assert!(session.quick_tasks().is_empty());
    assert_eq!(style_of(session, 2, "Trace"), Some(StyleTag::MethodDeclaration));
}

#[tokio::test]
async fn mono_runtime_defines_implicit_symbol() {
    let config = BuildConfiguration::default().with_runtime("Mono");
    let mut bench = Workbench::new(EngineContext::outline(Handle::current()), HighlightSettings::default(), config);
    let session = bench.open("a.cs", "#if __MonoCS__\nint mono;\n#else\nint other;\n#endif");
    assert_eq!(style_of(session, 1, "int"), Some(StyleTag::KeywordType));
    assert_eq!(style_of(session, 3, "int"), Some(StyleTag::ExcludedCode));
}

#[tokio::test]
async fn semantic_toggle_round_trip() {
    let mut session = open("class A { int x; }");
    session.wait_for_analysis().await;
    assert_eq!(style_of(&mut session, 0, "x"), Some(StyleTag::FieldDeclaration));

    session.set_semantic_highlighting(false);
    assert_eq!(style_of(&mut session, 0, "x"), Some(StyleTag::PlainText));

    session.set_semantic_highlighting(true);
    assert!(session.wait_for_analysis().await);
    assert_eq!(style_of(&mut session, 0, "x"), Some(StyleTag::FieldDeclaration));
}

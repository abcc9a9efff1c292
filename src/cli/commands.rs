//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use hilite_syntax::{DocumentHighlighter, Grammar, TokenClass};
use serde_json::{Value, json};
use tokio::runtime::Runtime;

use super::report::{DirectiveReport, UnresolvedNameReport};
use super::{CliError, CliResult, ExitCode, HighlightArgs};
use crate::render::StyledChunk;
use crate::session::{DocumentSession, EngineContext, Workbench};

/// Maximum source file size (16 MB).
const MAX_SOURCE_SIZE: u64 = 16 * 1024 * 1024;

/// Read a source file with a size check.
pub fn read_source(path: &Path) -> CliResult<String> {
    let metadata = fs::metadata(path)
        .map_err(|e| CliError::failure(format!("Cannot access file '{}': {}", path.display(), e)))?;

    if metadata.len() > MAX_SOURCE_SIZE {
        return Err(CliError::failure(format!(
            "Source file '{}' is too large ({} bytes, max {} bytes)",
            path.display(),
            metadata.len(),
            MAX_SOURCE_SIZE
        )));
    }

    fs::read_to_string(path).map_err(|e| CliError::failure(format!("Error reading file '{}': {}", path.display(), e)))
}

fn runtime() -> CliResult<Runtime> {
    Runtime::new().map_err(|e| CliError::failure(format!("Error starting async runtime: {}", e)))
}

/// Open `source` and wait for its first semantic pass.
fn open_analyzed<'w>(
    bench: &'w mut Workbench,
    runtime: &Runtime,
    name: &str,
    source: String,
) -> &'w mut DocumentSession {
    let session = bench.open(name, source);
    runtime.block_on(session.wait_for_analysis());
    session
}

fn workbench(runtime: &Runtime, options: &HighlightArgs) -> Workbench {
    Workbench::new(
        EngineContext::outline(runtime.handle().clone()),
        options.settings(),
        options.configuration(),
    )
}

/// Text of `[offset, offset + length)`, or empty if it is not a valid slice.
fn slice(text: &str, offset: usize, length: usize) -> &str {
    text.get(offset..offset + length).unwrap_or("")
}

/// One line of `highlight` output: non-blank chunks as `"text"=Style`.
pub fn format_styled_line(text: &str, line: usize, chunks: &[StyledChunk]) -> String {
    let parts: Vec<String> = chunks
        .iter()
        .filter_map(|chunk| {
            let piece = slice(text, chunk.offset, chunk.length);
            (!piece.trim().is_empty()).then(|| format!("{:?}={}", piece, chunk.style))
        })
        .collect();
    format!("{:>4}: {}", line + 1, parts.join(" "))
}

/// Print every line with its final styles.
pub fn highlight_file(path: &Path, options: &HighlightArgs) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    let runtime = runtime()?;
    let mut bench = workbench(&runtime, options);
    let name = path.display().to_string();
    let session = open_analyzed(&mut bench, &runtime, &name, source);

    let lines: Vec<Vec<StyledChunk>> = (0..session.line_count())
        .map(|line| session.styled_line(line).unwrap_or_default())
        .collect();
    let text = session.text();

    if options.json {
        let lines: Vec<Value> = lines
            .iter()
            .enumerate()
            .map(|(line, chunks)| {
                let chunks: Vec<Value> = chunks
                    .iter()
                    .map(|chunk| {
                        json!({
                            "offset": chunk.offset,
                            "length": chunk.length,
                            "style": chunk.style.as_str(),
                            "text": slice(text, chunk.offset, chunk.length),
                        })
                    })
                    .collect();
                json!({ "line": line + 1, "chunks": chunks })
            })
            .collect();
        println!("{}", json!({ "file": name, "lines": lines }));
    } else {
        for (line, chunks) in lines.iter().enumerate() {
            println!("{}", format_styled_line(text, line, chunks));
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Report unresolved names and directive problems. Fails if any name is unresolved.
pub fn tasks_file(path: &Path, options: &HighlightArgs) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    let runtime = runtime()?;
    let mut bench = workbench(&runtime, options);
    let name = path.display().to_string();
    let session = open_analyzed(&mut bench, &runtime, &name, source);

    let highlighter = session.highlighter();
    let position = |offset: usize| {
        let line = highlighter.line_at_offset(offset);
        let column = highlighter.line_span(line).map_or(0, |span| offset - span.start);
        (line + 1, column + 1)
    };

    let tasks = session.quick_tasks();
    let diagnostics: Vec<_> = session.diagnostics().collect();

    if options.json {
        let tasks: Vec<Value> = tasks
            .iter()
            .map(|task| {
                let (line, column) = position(task.offset());
                json!({
                    "message": task.message(),
                    "name": task.name(),
                    "offset": task.offset(),
                    "line": line,
                    "column": column,
                    "severity": format!("{:?}", task.severity).to_lowercase(),
                })
            })
            .collect();
        let diagnostics: Vec<Value> = diagnostics
            .iter()
            .map(|error| {
                let (line, column) = position(error.span.start);
                json!({
                    "kind": error.kind.to_string(),
                    "message": error.message,
                    "line": line,
                    "column": column,
                })
            })
            .collect();
        println!("{}", json!({ "file": name, "tasks": tasks, "diagnostics": diagnostics }));
    } else {
        let text = session.text();
        for error in &diagnostics {
            eprintln!("{:?}", miette::Report::new(DirectiveReport::new(&name, text, error)));
        }
        for task in tasks {
            eprintln!("{:?}", miette::Report::new(UnresolvedNameReport::new(&name, text, task)));
        }
        println!("{} unresolved name(s), {} directive problem(s)", tasks.len(), diagnostics.len());
    }

    if tasks.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Dump lexical chunks; no runtime, no semantic pass.
pub fn tokens_file(path: &Path, options: &HighlightArgs) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    let highlighter = DocumentHighlighter::new(
        Arc::new(Grammar::csharp()),
        options.settings().scan_options(),
        options.configuration().defined_symbols(),
        source,
    );
    let text = highlighter.text();

    let mut tokens = Vec::new();
    for line in 0..highlighter.line_count() {
        let (Some(span), Some(chunks)) = (highlighter.line_span(line), highlighter.line_chunks(line)) else {
            continue;
        };
        for chunk in chunks.iter().filter(|chunk| chunk.class != TokenClass::Whitespace) {
            let piece = slice(text, chunk.offset, chunk.length);
            if options.json {
                tokens.push(json!({
                    "line": line + 1,
                    "column": chunk.offset - span.start + 1,
                    "length": chunk.length,
                    "style": chunk.style.as_str(),
                    "rule": format!("{:?}", chunk.rule),
                    "class": format!("{:?}", chunk.class),
                    "text": piece,
                }));
            } else {
                println!(
                    "{}:{} {} {:?} {:?}",
                    line + 1,
                    chunk.offset - span.start + 1,
                    chunk.style,
                    chunk.class,
                    piece
                );
            }
        }
    }
    if options.json {
        println!("{}", Value::Array(tokens));
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use hilite_core::lang::styles::StyleTag;
    use std::env;
    use std::process;

    fn temp_source(tag: &str, text: &str) -> std::path::PathBuf {
        let path = env::temp_dir().join(format!("hilite_{}_{}.cs", tag, process::id()));
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_format_styled_line_skips_blanks() {
        let text = "int x;";
        let chunks = [
            StyledChunk::new(0, 3, StyleTag::KeywordType),
            StyledChunk::new(3, 1, StyleTag::PlainText),
            StyledChunk::new(4, 1, StyleTag::FieldDeclaration),
            StyledChunk::new(5, 1, StyleTag::Punctuation),
        ];
        assert_eq!(
            format_styled_line(text, 0, &chunks),
            "   1: \"int\"=Keyword(Type) \"x\"=User Field Declaration \";\"=Punctuation"
        );
    }

    #[test]
    fn test_missing_file_is_failure() {
        let err = read_source(Path::new("/definitely/not/here.cs")).unwrap_err();
        assert_eq!(err.exit_code, ExitCode::FAILURE);
        assert!(err.message.contains("Cannot access file"));
    }

    #[test]
    fn test_tasks_exit_code_follows_unresolved_names() {
        let bad = temp_source("tasks_bad", "class A { void M() { nope(); } }");
        let good = temp_source("tasks_good", "class A { void M() { M(); } }");
        let options = HighlightArgs::default();
        assert_eq!(tasks_file(&bad, &options).unwrap(), ExitCode::FAILURE);
        assert_eq!(tasks_file(&good, &options).unwrap(), ExitCode::SUCCESS);
        let _ = fs::remove_file(bad);
        let _ = fs::remove_file(good);
    }
}

//! Open documents.
//!
//! A [`DocumentSession`] ties one document's lexical highlighter to its semantic reactor and the per-line segment
//! cache. Everything on it runs on the caller's thread; only the semantic pass runs in the background, and its
//! results are applied when the caller polls.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::ops::Range;
use std::sync::Arc;

use hilite_core::lang::styles::StyleTag;
use hilite_syntax::diagnostics::CompileError;
use hilite_syntax::{Chunk, DefinedSymbolSet, DirtyLines, DocumentHighlighter, Grammar};
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::config::{BuildConfiguration, HighlightSettings};
use crate::error::HighlightResult;
use crate::reactor::{PassOutcome, SemanticReactor};
use crate::render::{ChunkRenderer, StyledChunk};
use crate::segment_index::LineSegments;
use crate::semantic::{DocumentSnapshot, ModelProvider, OutlineModelProvider, QuickTask, SemanticModel};

/// Called after a semantic pass publishes; re-read [`DocumentSession::quick_tasks`].
pub type TasksListener = Box<dyn FnMut()>;

/// Process-wide pieces every session shares.
#[derive(Clone)]
pub struct EngineContext {
    pub grammar: Arc<Grammar>,
    pub provider: Arc<dyn ModelProvider>,
    pub runtime: Handle,
}

impl EngineContext {
    pub fn new(grammar: Arc<Grammar>, provider: Arc<dyn ModelProvider>, runtime: Handle) -> Self {
        Self {
            grammar,
            provider,
            runtime,
        }
    }

    /// C# grammar with the outline-backed model provider.
    pub fn outline(runtime: Handle) -> Self {
        let grammar = Arc::new(Grammar::csharp());
        let provider = Arc::new(OutlineModelProvider::new(Arc::clone(&grammar)));
        Self::new(grammar, provider, runtime)
    }
}

pub struct DocumentSession {
    name: String,
    /// Bumped on every text change
    version: u64,
    settings: HighlightSettings,
    highlighter: DocumentHighlighter,
    reactor: SemanticReactor,
    model: Option<Arc<dyn SemanticModel>>,
    segments: LineSegments,
    tasks: Vec<QuickTask>,
    listeners: Vec<TasksListener>,
    closed: bool,
}

impl DocumentSession {
    pub fn open(
        name: impl Into<String>,
        text: impl Into<String>,
        context: &EngineContext,
        settings: HighlightSettings,
        symbols: DefinedSymbolSet,
    ) -> Self {
        let highlighter = DocumentHighlighter::new(Arc::clone(&context.grammar), settings.scan_options(), symbols, text);
        let mut session = Self {
            name: name.into(),
            version: 0,
            settings,
            highlighter,
            reactor: SemanticReactor::new(Arc::clone(&context.provider), context.runtime.clone()),
            model: None,
            segments: LineSegments::new(),
            tasks: Vec::new(),
            listeners: Vec::new(),
            closed: false,
        };
        debug!(document = %session.name, lines = session.line_count(), "document opened");
        session.reparse();
        session
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn text(&self) -> &str {
        self.highlighter.text()
    }

    pub fn line_count(&self) -> usize {
        self.highlighter.line_count()
    }

    pub fn settings(&self) -> &HighlightSettings {
        &self.settings
    }

    pub fn highlighter(&self) -> &DocumentHighlighter {
        &self.highlighter
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn is_analyzing(&self) -> bool {
        self.reactor.is_pending()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Lines with a built segment index.
    pub fn cached_segment_lines(&self) -> usize {
        self.segments.len()
    }

    pub fn quick_tasks(&self) -> &[QuickTask] {
        &self.tasks
    }

    /// Directive problems found by the scanner.
    pub fn diagnostics(&self) -> impl Iterator<Item = &CompileError> {
        self.highlighter.diagnostics()
    }

    /// Replace `range` with `replacement` and schedule a new semantic pass.
    ///
    /// The current model is dropped: its offsets no longer match the text. Lines paint lexically until the next
    /// pass publishes.
    pub fn edit(&mut self, range: Range<usize>, replacement: &str) -> HighlightResult<DirtyLines> {
        let dirty = self.highlighter.edit(range, replacement)?;
        if dirty.is_none() {
            return Ok(dirty);
        }
        self.version += 1;
        self.model = None;
        self.segments.clear();
        self.reparse();
        Ok(dirty)
    }

    /// Start a semantic pass for the current text, cancelling the one in flight.
    pub fn reparse(&mut self) {
        if self.closed || !self.settings.semantic_highlighting {
            return;
        }
        let snapshot = DocumentSnapshot {
            name: self.name.clone(),
            version: self.version,
            text: Arc::from(self.highlighter.text()),
            defines: self.highlighter.defined_symbols().clone(),
        };
        self.reactor.document_parsed(snapshot);
    }

    /// Apply a finished pass without waiting. Returns `true` if a new model was published.
    pub fn poll(&mut self) -> bool {
        match self.reactor.try_collect() {
            Some(outcome) => self.apply(outcome),
            None => false,
        }
    }

    /// Wait for the pass in flight and apply it. Returns `true` if a new model was published.
    pub async fn wait_for_analysis(&mut self) -> bool {
        match self.reactor.next_outcome().await {
            Some(outcome) => self.apply(outcome),
            None => false,
        }
    }

    fn apply(&mut self, outcome: PassOutcome) -> bool {
        match outcome {
            PassOutcome::Published { model, tasks, .. } => {
                self.model = Some(model);
                self.segments.clear();
                self.tasks = tasks;
                for listener in &mut self.listeners {
                    listener();
                }
                true
            }
            // Keep whatever model we had.
            PassOutcome::Failed { .. } => false,
        }
    }

    /// Final styles for `line`.
    pub fn styled_line(&mut self, line: usize) -> Option<Vec<StyledChunk>> {
        let span = self.highlighter.line_span(line)?;
        let chunks = self.highlighter.line_chunks(line)?;
        let model = active_model(&self.settings, &self.model);
        Some(ChunkRenderer::new(model, &mut self.segments).render_line(line, span, chunks))
    }

    /// Style at the start of `chunk` on `line`.
    pub fn style_for(&mut self, line: usize, chunk: Chunk) -> StyleTag {
        let Some(span) = self.highlighter.line_span(line) else {
            return chunk.style;
        };
        let model = active_model(&self.settings, &self.model);
        ChunkRenderer::new(model, &mut self.segments).style_for(line, span, &chunk)
    }

    pub fn on_tasks_updated(&mut self, listener: impl FnMut() + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn set_semantic_highlighting(&mut self, enabled: bool) {
        if self.settings.semantic_highlighting == enabled {
            return;
        }
        self.settings.semantic_highlighting = enabled;
        if enabled {
            self.reparse();
        } else {
            self.reactor.cancel();
            self.model = None;
            self.segments.clear();
        }
    }

    pub fn set_conditional_highlighting(&mut self, enabled: bool) -> DirtyLines {
        self.settings.conditional_highlighting = enabled;
        self.highlighter.set_scan_options(self.settings.scan_options())
    }

    /// Rebuild conditional state for new configured symbols and start a new pass.
    pub fn set_defined_symbols(&mut self, symbols: DefinedSymbolSet) -> DirtyLines {
        let dirty = self.highlighter.set_defined_symbols(symbols);
        self.reparse();
        dirty
    }

    /// Cancel analysis and drop listeners and derived state. Safe to call twice.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.reactor.cancel();
        self.listeners.clear();
        self.model = None;
        self.segments.clear();
        debug!(document = %self.name, "document closed");
    }
}

/// The model the renderer may use, if semantic highlighting is on.
fn active_model<'m>(
    settings: &HighlightSettings,
    model: &'m Option<Arc<dyn SemanticModel>>,
) -> Option<&'m dyn SemanticModel> {
    if settings.semantic_highlighting {
        model.as_deref()
    } else {
        None
    }
}

impl Drop for DocumentSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Every open document plus the active build configuration.
pub struct Workbench {
    context: EngineContext,
    settings: HighlightSettings,
    configuration: BuildConfiguration,
    documents: BTreeMap<String, DocumentSession>,
}

impl Workbench {
    pub fn new(context: EngineContext, settings: HighlightSettings, configuration: BuildConfiguration) -> Self {
        Self {
            context,
            settings,
            configuration,
            documents: BTreeMap::new(),
        }
    }

    pub fn configuration(&self) -> &BuildConfiguration {
        &self.configuration
    }

    /// Open `name`, replacing (and closing) any document already open under that name.
    pub fn open(&mut self, name: impl Into<String>, text: impl Into<String>) -> &mut DocumentSession {
        let name = name.into();
        let session = DocumentSession::open(
            name.clone(),
            text,
            &self.context,
            self.settings.clone(),
            self.configuration.defined_symbols(),
        );
        match self.documents.entry(name) {
            Entry::Occupied(mut entry) => {
                entry.insert(session);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(session),
        }
    }

    pub fn get(&self, name: &str) -> Option<&DocumentSession> {
        self.documents.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut DocumentSession> {
        self.documents.get_mut(name)
    }

    pub fn close(&mut self, name: &str) -> bool {
        self.documents.remove(name).is_some()
    }

    pub fn documents(&self) -> impl Iterator<Item = &DocumentSession> {
        self.documents.values()
    }

    /// Switch configuration: every open document is rebuilt from scratch and reparsed.
    pub fn set_active_configuration(&mut self, configuration: BuildConfiguration) {
        let symbols = configuration.defined_symbols();
        for session in self.documents.values_mut() {
            session.set_defined_symbols(symbols.clone());
        }
        info!(
            documents = self.documents.len(),
            symbols = ?symbols.sorted(),
            "active configuration changed"
        );
        self.configuration = configuration;
    }

    /// Poll every document; returns how many published a new model.
    pub fn poll_all(&mut self) -> usize {
        self.documents
            .values_mut()
            .map(DocumentSession::poll)
            .filter(|published| *published)
            .count()
    }
}

//! Document-parsed reactor: one background semantic pass per reparse.
//!
//! Every [`SemanticReactor::document_parsed`] cancels the pass in flight, bumps the generation and schedules a
//! new pass on the runtime's blocking pool. Completions come back over a channel and are only accepted if they
//! belong to the current generation and were not cancelled; everything else is dropped without a trace.
//!
//! The reactor never touches segment indexes. It hands the session a model and a task list, and the session
//! rebuilds segments on the render path.

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::{HighlightError, HighlightResult};
use crate::semantic::{DocumentSnapshot, ModelProvider, QuickTask, SemanticModel, collect_quick_tasks};

/// Result of an accepted pass.
pub enum PassOutcome {
    Published {
        generation: u64,
        model: Arc<dyn SemanticModel>,
        tasks: Vec<QuickTask>,
    },
    Failed {
        generation: u64,
        error: HighlightError,
    },
}

impl PassOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            PassOutcome::Published { generation, .. } | PassOutcome::Failed { generation, .. } => *generation,
        }
    }
}

impl fmt::Debug for PassOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassOutcome::Published { generation, tasks, .. } => f
                .debug_struct("Published")
                .field("generation", generation)
                .field("tasks", &tasks.len())
                .finish(),
            PassOutcome::Failed { generation, error } => f
                .debug_struct("Failed")
                .field("generation", generation)
                .field("error", error)
                .finish(),
        }
    }
}

type PassResult = HighlightResult<(Arc<dyn SemanticModel>, Vec<QuickTask>)>;

struct Completion {
    generation: u64,
    token: CancellationToken,
    result: PassResult,
}

pub struct SemanticReactor {
    provider: Arc<dyn ModelProvider>,
    runtime: Handle,
    generation: u64,
    /// Token of the pass in flight
    current: Option<CancellationToken>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
}

impl SemanticReactor {
    pub fn new(provider: Arc<dyn ModelProvider>, runtime: Handle) -> Self {
        let (completions_tx, completions) = mpsc::unbounded_channel();
        Self {
            provider,
            runtime,
            generation: 0,
            current: None,
            completions_tx,
            completions,
        }
    }

    /// Generation of the most recently scheduled pass.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_pending(&self) -> bool {
        self.current.is_some()
    }

    /// Cancel the pass in flight and schedule a new one for `snapshot`. Returns its generation.
    pub fn document_parsed(&mut self, snapshot: DocumentSnapshot) -> u64 {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let token = CancellationToken::new();
        self.current = Some(token.clone());

        debug!(
            generation,
            document = %snapshot.name,
            version = snapshot.version,
            "semantic pass scheduled"
        );

        let provider = Arc::clone(&self.provider);
        let tx = self.completions_tx.clone();
        self.runtime.spawn(async move {
            let pass_token = token.clone();
            let result = match tokio::task::spawn_blocking(move || {
                run_pass(provider.as_ref(), &snapshot, &pass_token)
            })
            .await
            {
                Ok(result) => result,
                Err(join_error) => Err(HighlightError::Analysis(join_error.to_string())),
            };
            // A closed receiver means the session is gone.
            let _ = tx.send(Completion {
                generation,
                token,
                result,
            });
        });
        generation
    }

    /// Cancel the pass in flight, if any. Its completion will be discarded.
    pub fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
            debug!(generation = self.generation, "semantic pass cancelled");
        }
    }

    /// Drain finished passes without waiting; returns the accepted outcome, if any.
    pub fn try_collect(&mut self) -> Option<PassOutcome> {
        let mut accepted = None;
        while let Ok(completion) = self.completions.try_recv() {
            if let Some(outcome) = self.accept(completion) {
                accepted = Some(outcome);
            }
        }
        accepted
    }

    /// Wait for the pass in flight. Returns `None` right away if nothing is pending.
    pub async fn next_outcome(&mut self) -> Option<PassOutcome> {
        while self.current.is_some() {
            let completion = self.completions.recv().await?;
            if let Some(outcome) = self.accept(completion) {
                return Some(outcome);
            }
        }
        None
    }

    fn accept(&mut self, completion: Completion) -> Option<PassOutcome> {
        let Completion {
            generation,
            token,
            result,
        } = completion;
        if generation != self.generation || token.is_cancelled() {
            debug!(generation, current = self.generation, "discarding stale semantic pass");
            return None;
        }
        self.current = None;

        match result {
            Ok((model, tasks)) => {
                debug!(generation, tasks = tasks.len(), "semantic pass published");
                Some(PassOutcome::Published {
                    generation,
                    model,
                    tasks,
                })
            }
            Err(HighlightError::Cancelled) => {
                debug!(generation, "semantic pass stopped early");
                None
            }
            Err(error @ HighlightError::ModelUnavailable(_)) => {
                debug!(generation, %error, "no semantic model for this pass");
                Some(PassOutcome::Failed { generation, error })
            }
            Err(error) => {
                error!(generation, %error, "error while analyzing the file for semantic highlighting");
                Some(PassOutcome::Failed { generation, error })
            }
        }
    }
}

impl Drop for SemanticReactor {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn run_pass(provider: &dyn ModelProvider, snapshot: &DocumentSnapshot, cancel: &CancellationToken) -> PassResult {
    let model = provider
        .semantic_model(snapshot, cancel)?
        .ok_or_else(|| HighlightError::ModelUnavailable(snapshot.name.clone()))?;
    let tasks = collect_quick_tasks(model.as_ref(), cancel)?;
    Ok((model, tasks))
}
